//! Proposal Stage entry point
//!
//! Resolves assets, builds the scenes and runs the animation loop in the
//! browser. The native binary runs a short headless demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::rc::Rc;

    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement,
        HtmlImageElement, MouseEvent, TouchEvent,
    };

    use proposal_stage::assets::{
        AssetDescriptor, AssetKind, AssetResolver, AssetStatus, background_sources,
    };
    use proposal_stage::audio::{AudioManager, Cue, Track, TrackSet, spectrum_bars};
    use proposal_stage::consts::*;
    use proposal_stage::persistence::Acceptance;
    use proposal_stage::platform::dom::{self, DomHost};
    use proposal_stage::platform::probe::WebProbe;
    use proposal_stage::scene::{Action, Flow, Notice, SceneManager, SceneTag, Step};
    use proposal_stage::sim::{
        CatchOutcome, EvadingButton, ParticleKind, ParticleSystem, PointerResponse, Ring,
        RingEvent, RingPhase,
    };
    use proposal_stage::stages::{
        Announced, BalloonStage, CardState, ComplimentQueue, FlipOutcome, MemoryMatchStage,
        PopOutcome, SharedStage, run_sequence,
    };
    use proposal_stage::ui::{Control, SecretKnock, Slideshow, Typewriter, success_controls};
    use proposal_stage::{Content, PlatformError, Settings, Tuning, ms_to_ticks};

    /// Input collected by listeners and drained once per frame
    #[derive(Debug, Clone, Copy)]
    enum Input {
        Action(Action),
        PointerMove(Vec2),
        PointerDown(Vec2),
        TouchStart(Vec2),
        TouchEnd(f32),
        Skip,
        ToggleMusic,
        ToggleVoice,
        ReplayVoice,
        ToggleMotion,
        Pop(u32),
        Flip(usize),
    }

    type Mailbox = Rc<RefCell<VecDeque<Input>>>;

    type SharedBalloons = Rc<RefCell<Announced<BalloonStage>>>;
    type SharedMemory = Rc<RefCell<Announced<MemoryMatchStage>>>;

    struct IntroView {
        typewriter: Typewriter,
        slideshow: Slideshow,
        text: HtmlElement,
        backgrounds: Vec<HtmlElement>,
        motion: HtmlElement,
        music: HtmlElement,
        voice: HtmlElement,
        visualizer: HtmlCanvasElement,
        spectrum: CanvasRenderingContext2d,
    }

    struct ProposalView {
        button: EvadingButton,
        no: HtmlElement,
        notice: HtmlElement,
    }

    struct ChaseView {
        ring: Rc<RefCell<Ring>>,
        ring_el: HtmlElement,
        hud: HtmlElement,
        notice: HtmlElement,
        retry: HtmlElement,
    }

    struct BalloonView {
        stage: SharedBalloons,
        board: HtmlElement,
        counter: HtmlElement,
        reward: HtmlElement,
        elements: HashMap<u32, HtmlElement>,
    }

    struct MemoryView {
        stage: SharedMemory,
        cards: Vec<HtmlElement>,
        reward: HtmlElement,
    }

    /// Per-scene runtime state
    enum View {
        None,
        Intro(IntroView),
        Adventure,
        Proposal(ProposalView),
        Chase(ChaseView),
        Success { next_burst: u32 },
        Balloons(BalloonView),
        Memory(MemoryView),
        Final,
    }

    /// Sprites for the particle overlay
    struct Sprites {
        heart: HtmlImageElement,
        confetti: Option<HtmlImageElement>,
    }

    struct App {
        doc: Document,
        tuning: Tuning,
        content: Content,
        settings: Settings,
        rng: Pcg32,
        flow: Flow,
        scenes: SceneManager<DomHost>,
        mailbox: Mailbox,
        audio: AudioManager,
        backgrounds: Vec<String>,
        sprites: Sprites,
        particles: ParticleSystem,
        fx_canvas: HtmlCanvasElement,
        fx: CanvasRenderingContext2d,
        /// Scratch buffer for music spectrum levels
        levels: Vec<u8>,
        view: View,
        pending_balloons: Option<SharedBalloons>,
        pending_memory: Option<SharedMemory>,
        secret: SecretKnock,
        viewport: Vec2,
        accumulator: f32,
        last_time: f64,
    }

    impl App {
        // === Frame loop ===

        fn frame(&mut self, time: f64) {
            let dt_ms = if self.last_time > 0.0 {
                time - self.last_time
            } else {
                f64::from(TICK_MS)
            };
            self.last_time = time;

            let viewport = dom::viewport();
            if viewport != self.viewport {
                self.resize(viewport);
            }

            let inputs: Vec<Input> = self.mailbox.borrow_mut().drain(..).collect();
            for input in inputs {
                self.handle(input);
            }

            let dt = ((dt_ms / 1000.0) as f32).min(0.1);
            self.accumulator += dt;
            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.tick();
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            self.animate(dt_ms);
            self.draw_particles();
        }

        fn tick(&mut self) {
            let mut actions = Vec::new();
            match &mut self.view {
                View::Chase(chase) => match chase.ring.borrow_mut().tick(&mut self.rng) {
                    Some(RingEvent::Completed) => actions.push(Action::RingCaught),
                    Some(RingEvent::Escaped) => actions.push(Action::RingEscaped),
                    None => {}
                },
                View::Success { next_burst } => {
                    *next_burst = next_burst.saturating_sub(1);
                    if *next_burst == 0 {
                        *next_burst = ms_to_ticks(self.tuning.particles.burst_interval_ms);
                        let margin = Vec2::splat(100.0);
                        let hi = (self.viewport - margin).max(margin);
                        let at = Vec2::new(
                            self.rng.random_range(margin.x..=hi.x),
                            self.rng.random_range(margin.y..=hi.y),
                        );
                        self.particles
                            .spawn(at, self.tuning.particles.burst_count, &mut self.rng);
                    }
                }
                View::Balloons(view) => view.stage.borrow_mut().inner_mut().tick(&mut self.rng),
                View::Memory(view) => view.stage.borrow_mut().inner_mut().tick(),
                _ => {}
            }
            self.particles.tick();

            for action in actions {
                self.dispatch(action);
            }
        }

        fn resize(&mut self, viewport: Vec2) {
            self.viewport = viewport;
            self.fx_canvas.set_width(viewport.x as u32);
            self.fx_canvas.set_height(viewport.y as u32);
            match &mut self.view {
                View::Proposal(view) => {
                    view.button.resize(viewport);
                    dom::place(&view.no, view.button.pos);
                }
                View::Chase(view) => view.ring.borrow_mut().resize(viewport),
                View::Balloons(view) => measure_board(view),
                _ => {}
            }
        }

        // === Input ===

        fn handle(&mut self, input: Input) {
            match input {
                Input::Action(action) => self.dispatch(action),
                Input::PointerMove(p) => self.pointer_move(p),
                Input::PointerDown(p) => self.pointer_down(p),
                Input::TouchStart(p) => match &mut self.view {
                    View::Proposal(view) => {
                        if let PointerResponse::Dodged { to } =
                            view.button.on_touch_start(p, &mut self.rng)
                        {
                            dom::place(&view.no, to);
                        }
                    }
                    View::Intro(view) => view.slideshow.touch_start(p.x),
                    _ => {}
                },
                Input::TouchEnd(x) => {
                    if let View::Intro(view) = &mut self.view {
                        if let Some(i) = view.slideshow.touch_end(x) {
                            show_background(&view.backgrounds, i);
                        }
                    }
                }
                Input::Skip => {
                    if let View::Intro(view) = &mut self.view {
                        view.typewriter.skip();
                        view.text.set_text_content(Some(view.typewriter.visible()));
                    }
                }
                Input::ToggleMusic => {
                    if self.audio.toggle(Track::Music) {
                        self.audio.attach_visualizer();
                    }
                }
                Input::ToggleVoice => {
                    self.audio.toggle(Track::Voice);
                }
                Input::ReplayVoice => self.audio.play(Track::Voice),
                Input::ToggleMotion => self.toggle_motion(),
                Input::Pop(id) => self.pop(id),
                Input::Flip(index) => self.flip(index),
            }
        }

        fn pointer_move(&mut self, p: Vec2) {
            match &mut self.view {
                View::Proposal(view) => {
                    if let PointerResponse::Dodged { to } =
                        view.button.on_pointer_move(p, &mut self.rng)
                    {
                        dom::place(&view.no, to);
                    }
                }
                View::Intro(view) if self.settings.effective_parallax() => {
                    parallax(&view.backgrounds, p, self.viewport);
                }
                _ => {}
            }
        }

        fn pointer_down(&mut self, p: Vec2) {
            self.audio.on_gesture();

            if self.secret.tap(p, self.viewport, dom::now_ms()) {
                if let Ok(window) = dom::window() {
                    let _ = window.alert_with_message(&self.content.secret_message);
                }
            }

            if let View::Chase(chase) = &self.view {
                let mut ring = chase.ring.borrow_mut();
                if ring.try_catch(p) == CatchOutcome::Caught {
                    let center = ring.rect().center();
                    drop(ring);
                    self.audio.cue(Cue::Catch);
                    self.particles
                        .spawn(center, self.tuning.ring.catch_burst, &mut self.rng);
                }
            }
        }

        fn toggle_motion(&mut self) {
            let reduced = self.settings.toggle_reduced_motion();
            self.settings.save();
            self.particles.set_capacity(self.settings.max_particles());
            if let View::Intro(view) = &self.view {
                view.motion.set_text_content(Some(motion_label(reduced)));
                if reduced {
                    for bg in &view.backgrounds {
                        let _ = bg.style().remove_property("transform");
                    }
                }
            }
        }

        fn pop(&mut self, id: u32) {
            let View::Balloons(view) = &mut self.view else {
                return;
            };
            let outcome = view.stage.borrow_mut().inner_mut().pop(id);
            let threshold = view.stage.borrow().inner().threshold();
            match outcome {
                PopOutcome::Popped { compliment, popped } => {
                    self.audio.cue(Cue::Pop);
                    view.reward.set_text_content(compliment.as_deref());
                    view.counter
                        .set_text_content(Some(&format!("{} / {}", popped, threshold)));
                }
                PopOutcome::Completed { compliment } => {
                    self.audio.cue(Cue::Fanfare);
                    view.reward.set_text_content(compliment.as_deref());
                    view.counter
                        .set_text_content(Some(&format!("{} / {}", threshold, threshold)));
                }
                PopOutcome::Ignored => {}
            }
        }

        fn flip(&mut self, index: usize) {
            let View::Memory(view) = &mut self.view else {
                return;
            };
            let outcome = view.stage.borrow_mut().inner_mut().click(index);
            match outcome {
                FlipOutcome::Matched {
                    compliment,
                    completed,
                } => {
                    self.audio
                        .cue(if completed { Cue::Fanfare } else { Cue::Match });
                    view.reward.set_text_content(compliment.as_deref());
                }
                FlipOutcome::Mismatched => self.audio.cue(Cue::Miss),
                FlipOutcome::Revealed | FlipOutcome::Ignored => {}
            }
        }

        // === Scene flow ===

        fn dispatch(&mut self, action: Action) {
            match self.flow.apply(action) {
                Step::Entered { from, to } => {
                    match action {
                        Action::Continue | Action::Play => self.audio.play(Track::Interactions),
                        Action::Accept => {
                            self.audio.play(Track::Interactions);
                            Acceptance::accepted_at(dom::now_ms()).save();
                        }
                        _ => {}
                    }
                    if from == SceneTag::Success && to == SceneTag::Balloons {
                        self.start_rewards();
                    }
                    if let Err(e) = self.enter(to) {
                        log::error!("Could not show {}: {}", to.as_str(), e);
                    }
                }
                Step::Notified(notice) => self.notify(notice),
                Step::Ignored => {}
            }
        }

        fn notify(&mut self, notice: Notice) {
            match (notice, &self.view) {
                (Notice::DeclineAcknowledged, View::Proposal(view)) => {
                    view.notice
                        .set_text_content(Some(&self.content.decline_notice));
                }
                (Notice::RingEscaped, View::Chase(view)) => {
                    view.notice.set_text_content(Some(&self.content.escape_notice));
                    let _ = view.retry.style().remove_property("display");
                }
                _ => log::debug!("Notice {:?} outside its scene", notice),
            }
        }

        /// Create both reward stages and chain them
        fn start_rewards(&mut self) {
            let mailbox = self.mailbox.clone();
            let observer: Rc<dyn Fn(&'static str)> = Rc::new(move |_name: &'static str| {
                mailbox
                    .borrow_mut()
                    .push_back(Input::Action(Action::StageDone));
            });

            let balloons: SharedBalloons = Rc::new(RefCell::new(Announced::new(
                BalloonStage::new(
                    &self.tuning.balloons,
                    self.viewport * 0.8,
                    ComplimentQueue::new(self.content.compliments.clone()),
                ),
                observer.clone(),
            )));
            let memory: SharedMemory = Rc::new(RefCell::new(Announced::new(
                MemoryMatchStage::new(
                    &self.tuning.memory,
                    ComplimentQueue::new(self.content.compliments.clone()),
                    &mut self.rng,
                ),
                observer,
            )));

            self.pending_balloons = Some(balloons.clone());
            self.pending_memory = Some(memory.clone());
            run_sequence(
                vec![balloons as SharedStage, memory as SharedStage],
                Box::new(|| log::info!("All reward stages finished")),
            );
        }

        fn enter(&mut self, tag: SceneTag) -> Result<(), PlatformError> {
            let doc = self.doc.clone();
            let scene = dom::el(&doc, "div", "scene")?;
            scene.set_attribute("data-scene", tag.as_str())?;

            let view = match tag {
                SceneTag::Intro => View::Intro(self.build_intro(&doc, &scene)?),
                SceneTag::AdventureModal => {
                    self.build_card(
                        &doc,
                        &scene,
                        "An adventure",
                        &self.content.adventure_text,
                        &[Control::CloseAdventure],
                    )?;
                    View::Adventure
                }
                SceneTag::Proposal => View::Proposal(self.build_proposal(&doc, &scene)?),
                SceneTag::RingChase => View::Chase(self.build_chase(&doc, &scene)?),
                SceneTag::Success => {
                    let controls = success_controls(self.audio.is_available(Track::Voice));
                    self.build_card(
                        &doc,
                        &scene,
                        "💍 You said YES!",
                        &self.content.success_text,
                        &controls,
                    )?;
                    self.celebrate();
                    View::Success {
                        next_burst: ms_to_ticks(self.tuning.particles.burst_interval_ms),
                    }
                }
                SceneTag::Balloons => View::Balloons(self.build_balloons(&doc, &scene)?),
                SceneTag::MemoryMatch => View::Memory(self.build_memory(&doc, &scene)?),
                SceneTag::Final => {
                    self.build_card(&doc, &scene, "❤️", &self.content.final_text, &[])?;
                    self.celebrate();
                    View::Final
                }
            };

            let node: Element = scene.into();
            if let View::Chase(chase) = &view {
                let ring = chase.ring.clone();
                self.scenes
                    .show_with_teardown(tag, node, move || ring.borrow_mut().stop());
            } else {
                self.scenes.show(tag, node);
            }
            self.view = view;

            if let View::Balloons(view) = &self.view {
                measure_board(view);
            }
            Ok(())
        }

        fn celebrate(&mut self) {
            self.audio.cue(Cue::Fanfare);
            let at = Vec2::new(self.viewport.x * 0.5, self.viewport.y * 0.4);
            self.particles
                .spawn(at, self.tuning.particles.celebration_count, &mut self.rng);
        }

        // === Scene builders ===

        fn build_card(
            &self,
            doc: &Document,
            scene: &HtmlElement,
            title: &str,
            body: &str,
            controls: &[Control],
        ) -> Result<HtmlElement, PlatformError> {
            let card = dom::el(doc, "div", "card")?;
            let heading = dom::text(doc, "h2", "title", title)?;
            let para = dom::text(doc, "div", "para", body)?;
            dom::append_all(&card, &[&heading, &para])?;
            if let Some((primary, rest)) = controls.split_last() {
                let row = dom::el(doc, "div", "row")?;
                for control in rest {
                    row.append_child(&control_button(doc, "btn secondary", *control)?)?;
                }
                row.append_child(&control_button(doc, "btn", *primary)?)?;
                card.append_child(&row)?;
            }
            scene.append_child(&card)?;
            Ok(card)
        }

        fn build_intro(
            &self,
            doc: &Document,
            scene: &HtmlElement,
        ) -> Result<IntroView, PlatformError> {
            let mut backgrounds = Vec::with_capacity(self.backgrounds.len());
            for src in &self.backgrounds {
                let bg = dom::el(doc, "div", "bg")?;
                bg.style()
                    .set_property("background-image", &format!("url(\"{}\")", src))?;
                scene.append_child(&bg)?;
                backgrounds.push(bg);
            }
            show_background(&backgrounds, 0);

            let card = dom::el(doc, "div", "card")?;
            let title = dom::text(doc, "h1", "title", &self.content.title)?;
            let text = dom::el(doc, "div", "para")?;

            let row = dom::el(doc, "div", "row")?;
            let next = control_button(doc, "btn", Control::Continue)?;
            let skip = control_button(doc, "btn secondary", Control::Skip)?;
            let adventure = control_button(doc, "btn secondary", Control::Adventure)?;
            let motion = control_button(doc, "btn secondary", Control::Motion)?;
            motion.set_text_content(Some(motion_label(self.settings.reduced_motion)));
            dom::append_all(&row, &[&next, &skip, &adventure, &motion])?;

            let audio_row = dom::el(doc, "div", "row")?;
            let music = control_button(doc, "btn secondary", Control::Music)?;
            if !self.audio.is_available(Track::Music) {
                music.set_text_content(Some("Music unavailable"));
                music.set_attribute("disabled", "")?;
            }
            let voice = control_button(doc, "btn secondary", Control::Voice)?;
            voice.set_title(Control::ReplayVoice.label());
            if !self.audio.is_available(Track::Voice) {
                voice.style().set_property("display", "none")?;
            }
            dom::append_all(&audio_row, &[&music, &voice])?;
            let (visualizer, spectrum) = dom::canvas(doc, "visualizer")?;

            dom::append_all(&card, &[&title, &text, &row, &audio_row, &visualizer])?;
            scene.append_child(&card)?;

            let intro = &self.tuning.intro;
            Ok(IntroView {
                typewriter: Typewriter::new(
                    self.content.intro_text.clone(),
                    intro.typing_ms_per_char,
                    intro.line_pause_factor,
                ),
                slideshow: Slideshow::new(
                    backgrounds.len(),
                    intro.slideshow_interval_ms,
                    intro.swipe_threshold,
                ),
                text,
                backgrounds,
                motion,
                music,
                voice,
                visualizer,
                spectrum,
            })
        }

        fn build_proposal(
            &mut self,
            doc: &Document,
            scene: &HtmlElement,
        ) -> Result<ProposalView, PlatformError> {
            let card = dom::el(doc, "div", "card")?;
            let title = dom::text(doc, "h2", "title", &self.content.proposal_title)?;
            let sub = dom::text(doc, "div", "para", &self.content.proposal_subtitle)?;
            let row = dom::el(doc, "div", "row")?;
            let yes = control_button(doc, "btn", Control::Yes)?;
            row.append_child(&yes)?;
            let notice = dom::el(doc, "div", "notice")?;
            dom::append_all(&card, &[&title, &sub, &row, &notice])?;
            scene.append_child(&card)?;

            let size = Vec2::new(96.0, 44.0);
            let no = control_button(doc, "btn secondary evade", Control::No)?;
            no.style().set_property("width", &format!("{}px", size.x))?;
            no.style().set_property("height", &format!("{}px", size.y))?;
            scene.append_child(&no)?;

            let start = self.viewport * 0.5 + Vec2::new(90.0, 120.0);
            let mut button = EvadingButton::new(&self.tuning.evasion, start, size, self.viewport);
            button.resize(self.viewport);
            dom::place(&no, button.pos);

            let center = Vec2::new(self.viewport.x * 0.5, self.viewport.y * 0.3);
            self.particles
                .spawn(center, self.tuning.particles.teaser_count, &mut self.rng);

            Ok(ProposalView {
                button,
                no,
                notice,
            })
        }

        fn build_chase(
            &mut self,
            doc: &Document,
            scene: &HtmlElement,
        ) -> Result<ChaseView, PlatformError> {
            let arena = dom::el(doc, "div", "arena")?;
            let ring = Ring::new(&self.tuning.ring, self.viewport, &mut self.rng);

            let ring_el = dom::text(doc, "div", "ring", "💍")?;
            let style = ring_el.style();
            style.set_property("width", &format!("{}px", ring.size))?;
            style.set_property("height", &format!("{}px", ring.size))?;
            style.set_property("font-size", &format!("{}px", ring.size * 0.8))?;

            let hud = dom::text(doc, "div", "hud", &self.content.chase_hint)?;
            let notice = dom::el(doc, "div", "notice")?;
            let retry = control_button(doc, "btn", Control::Retry)?;
            retry.style().set_property("display", "none")?;
            dom::append_all(&hud, &[&notice, &retry])?;

            dom::append_all(&arena, &[&ring_el, &hud])?;
            scene.append_child(&arena)?;

            Ok(ChaseView {
                ring: Rc::new(RefCell::new(ring)),
                ring_el,
                hud,
                notice,
                retry,
            })
        }

        fn build_balloons(
            &mut self,
            doc: &Document,
            scene: &HtmlElement,
        ) -> Result<BalloonView, PlatformError> {
            let stage = self
                .pending_balloons
                .take()
                .ok_or(PlatformError::Missing("balloon stage"))?;
            let threshold = stage.borrow().inner().threshold();

            let board = dom::el(doc, "div", "board")?;
            let title = dom::text(doc, "h3", "reward", &format!("Pop {} balloons", threshold))?;
            let counter = dom::text(doc, "div", "reward", &format!("0 / {}", threshold))?;
            let reward = dom::el(doc, "div", "reward")?;
            dom::append_all(&board, &[&title, &counter, &reward])?;
            scene.append_child(&board)?;

            Ok(BalloonView {
                stage,
                board,
                counter,
                reward,
                elements: HashMap::new(),
            })
        }

        fn build_memory(
            &mut self,
            doc: &Document,
            scene: &HtmlElement,
        ) -> Result<MemoryView, PlatformError> {
            let stage = self
                .pending_memory
                .take()
                .ok_or(PlatformError::Missing("memory stage"))?;

            let board = dom::el(doc, "div", "board")?;
            let title = dom::text(doc, "h3", "reward", "Match the pairs")?;
            let grid = dom::el(doc, "div", "cards")?;
            let mut cards = Vec::new();
            for i in 0..stage.borrow().inner().cards().len() {
                let card = dom::el(doc, "button", "cardface")?;
                card.set_attribute("data-card", &i.to_string())?;
                grid.append_child(&card)?;
                cards.push(card);
            }
            let reward = dom::el(doc, "div", "reward")?;
            dom::append_all(&board, &[&title, &grid, &reward])?;
            scene.append_child(&board)?;

            Ok(MemoryView {
                stage,
                cards,
                reward,
            })
        }

        // === Rendering ===

        fn animate(&mut self, dt_ms: f64) {
            match &mut self.view {
                View::Intro(view) => {
                    if view.typewriter.advance(dt_ms) {
                        view.text.set_text_content(Some(view.typewriter.visible()));
                    }
                    if let Some(i) = view.slideshow.advance(dt_ms) {
                        show_background(&view.backgrounds, i);
                    }
                    if self.audio.is_available(Track::Music) {
                        let label = if self.audio.is_playing(Track::Music) {
                            "Pause music"
                        } else {
                            "Play music"
                        };
                        view.music.set_text_content(Some(label));
                    }
                    let voice = if self.audio.is_playing(Track::Voice) {
                        "⏸"
                    } else {
                        "▶"
                    };
                    view.voice.set_text_content(Some(voice));
                    if self.audio.spectrum(&mut self.levels) {
                        draw_spectrum(&view.visualizer, &view.spectrum, &self.levels);
                    }
                }
                View::Chase(view) => {
                    let ring = view.ring.borrow();
                    let scale = ring.visual_scale();
                    let style = view.ring_el.style();
                    let _ = style.set_property(
                        "transform",
                        &format!(
                            "translate({:.1}px, {:.1}px) scale({:.3})",
                            ring.pos.x, ring.pos.y, scale
                        ),
                    );
                    let _ = style.set_property("opacity", &format!("{:.3}", scale));
                    if ring.phase() == RingPhase::Flying && ring.running {
                        let secs = (ring.remaining_ticks() as f32 * TICK_MS / 1000.0).ceil();
                        if let Some(first) = view.hud.first_child() {
                            first.set_text_content(Some(&format!(
                                "{} {}s",
                                self.content.chase_hint, secs
                            )));
                        }
                    }
                }
                View::Balloons(view) => sync_balloons(&self.doc, view),
                View::Memory(view) => sync_cards(view),
                _ => {}
            }
        }

        fn draw_particles(&self) {
            let ctx = &self.fx;
            ctx.clear_rect(0.0, 0.0, self.viewport.x as f64, self.viewport.y as f64);
            for p in self.particles.iter() {
                let s = f64::from(p.size);
                ctx.save();
                ctx.set_global_alpha(f64::from(p.alpha()));
                let _ = ctx.translate(f64::from(p.pos.x), f64::from(p.pos.y));
                let _ = ctx.rotate(f64::from(p.rotation));
                match (p.kind, &self.sprites.confetti) {
                    (ParticleKind::Heart, _) => {
                        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                            &self.sprites.heart,
                            -s / 2.0,
                            -s / 2.0,
                            s,
                            s,
                        );
                    }
                    (ParticleKind::Confetti, Some(img)) if img.complete() => {
                        let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                            img,
                            -s / 2.0,
                            -s / 2.0,
                            s,
                            s,
                        );
                    }
                    (ParticleKind::Confetti, _) => {
                        let [r, g, b] = p.tint;
                        ctx.set_fill_style_str(&format!("rgb({},{},{})", r, g, b));
                        ctx.fill_rect(-s / 4.0, -s / 8.0, s / 2.0, s / 4.0);
                    }
                }
                ctx.restore();
            }
        }
    }

    fn motion_label(reduced: bool) -> &'static str {
        if reduced {
            "Reduce motion: ON"
        } else {
            "Reduce motion: OFF"
        }
    }

    fn show_background(backgrounds: &[HtmlElement], index: usize) {
        for (i, bg) in backgrounds.iter().enumerate() {
            let _ = bg.class_list().toggle_with_force("visible", i == index);
        }
    }

    fn parallax(backgrounds: &[HtmlElement], p: Vec2, viewport: Vec2) {
        let shift = (p / viewport.max(Vec2::ONE) - Vec2::splat(0.5)) * 6.0;
        for (i, bg) in backgrounds.iter().enumerate() {
            let depth = (i + 1) as f32 / 10.0;
            let _ = bg.style().set_property(
                "transform",
                &format!(
                    "translate({:.2}px, {:.2}px) scale(1.02)",
                    shift.x * depth,
                    shift.y * depth
                ),
            );
        }
    }

    fn measure_board(view: &BalloonView) {
        let area = Vec2::new(
            view.board.client_width() as f32,
            view.board.client_height() as f32,
        );
        if area.x > 0.0 && area.y > 0.0 {
            view.stage.borrow_mut().inner_mut().resize(area);
        }
    }

    /// Mirror live balloons into DOM elements
    fn sync_balloons(doc: &Document, view: &mut BalloonView) {
        let stage = view.stage.borrow();
        let mut live = HashSet::new();
        for balloon in stage.inner().balloons() {
            live.insert(balloon.id);
            let element = match view.elements.get(&balloon.id) {
                Some(element) => element.clone(),
                None => {
                    let Ok(element) = dom::el(doc, "div", "balloon") else {
                        continue;
                    };
                    let _ = element.set_attribute("data-balloon", &balloon.id.to_string());
                    let style = element.style();
                    let _ = style.set_property("width", &format!("{:.0}px", balloon.size));
                    let _ = style.set_property("height", &format!("{:.0}px", balloon.size));
                    let _ = view.board.append_child(&element);
                    view.elements.insert(balloon.id, element.clone());
                    element
                }
            };
            let pos = balloon.pos();
            let _ = element.style().set_property(
                "transform",
                &format!("translate({:.1}px, {:.1}px)", pos.x, pos.y),
            );
        }
        view.elements.retain(|id, element| {
            let keep = live.contains(id);
            if !keep {
                element.remove();
            }
            keep
        });
    }

    fn sync_cards(view: &MemoryView) {
        let stage = view.stage.borrow();
        for (card, element) in stage.inner().cards().iter().zip(&view.cards) {
            let (class, face) = match card.state {
                CardState::FaceDown => ("cardface", ""),
                CardState::Revealed => ("cardface revealed", card.symbol.as_str()),
                CardState::Matched => ("cardface matched", card.symbol.as_str()),
            };
            if element.class_name() != class {
                element.set_class_name(class);
                element.set_text_content(Some(face));
            }
        }
    }

    fn control_button(
        doc: &Document,
        class: &str,
        control: Control,
    ) -> Result<HtmlElement, PlatformError> {
        dom::button(doc, class, control.name(), control.label())
    }

    /// Redraw the music spectrum, matching the canvas to its laid-out size
    fn draw_spectrum(canvas: &HtmlCanvasElement, ctx: &CanvasRenderingContext2d, levels: &[u8]) {
        let width = canvas.client_width().max(0) as u32;
        let height = canvas.client_height().max(0) as u32;
        if canvas.width() != width {
            canvas.set_width(width);
        }
        if canvas.height() != height {
            canvas.set_height(height);
        }
        ctx.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
        for bar in spectrum_bars(levels, Vec2::new(width as f32, height as f32)) {
            ctx.set_fill_style_str(&format!("rgba(123,223,246,{:.2})", bar.alpha));
            ctx.fill_rect(
                f64::from(bar.x),
                f64::from(bar.y),
                f64::from(bar.width),
                f64::from(bar.height),
            );
        }
    }

    /// Map a click target to an input via its `data-*` attributes
    fn click_input(target: &Element) -> Option<Input> {
        if let Some(el) = target.closest("[data-action]").ok().flatten() {
            let name = el.get_attribute("data-action")?;
            let Some(control) = Control::from_name(&name) else {
                log::debug!("Unknown action: {}", name);
                return None;
            };
            if let Some(action) = control.action() {
                return Some(Input::Action(action));
            }
            return match control {
                Control::Skip => Some(Input::Skip),
                Control::Music => Some(Input::ToggleMusic),
                Control::Voice => Some(Input::ToggleVoice),
                Control::ReplayVoice => Some(Input::ReplayVoice),
                Control::Motion => Some(Input::ToggleMotion),
                _ => None,
            };
        }
        if let Some(el) = target.closest("[data-balloon]").ok().flatten() {
            return el.get_attribute("data-balloon")?.parse().ok().map(Input::Pop);
        }
        let el = target.closest("[data-card]").ok().flatten()?;
        el.get_attribute("data-card")?.parse().ok().map(Input::Flip)
    }

    /// Optional JSON overrides embedded in the page
    fn embedded_json(doc: &Document, id: &str) -> Option<String> {
        doc.get_element_by_id(id)?.text_content()
    }

    fn load_tuning(doc: &Document) -> Tuning {
        let Some(json) = embedded_json(doc, "proposal-tuning") else {
            return Tuning::default();
        };
        Tuning::from_json(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring tuning overrides: {}", e);
            Tuning::default()
        })
    }

    fn load_content(doc: &Document) -> Content {
        let Some(json) = embedded_json(doc, "proposal-content") else {
            return Content::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring content overrides: {}", e);
            Content::default()
        })
    }

    fn image(src: &str) -> Result<HtmlImageElement, PlatformError> {
        let img = HtmlImageElement::new()?;
        img.set_src(src);
        Ok(img)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Proposal Stage starting...");
        if let Err(e) = start().await {
            log::error!("Start-up failed: {}", e);
        }
    }

    async fn start() -> Result<(), PlatformError> {
        let doc = dom::document()?;
        dom::inject_styles(&doc)?;
        let body = doc.body().ok_or(PlatformError::Missing("body"))?;

        let tuning = load_tuning(&doc);
        let content = load_content(&doc);
        let settings = Settings::load();
        if Acceptance::load().accepted {
            log::info!("Welcome back");
        }

        let seed = js_sys::Date::now() as u64;
        let mut rng = Pcg32::seed_from_u64(seed);
        log::info!("Seeded with {}", seed);

        // Preloader
        let pre = dom::el(&doc, "div", "preloader")?;
        let inner = dom::text(&doc, "div", "", "Loading a special surprise...")?;
        let bar = dom::el(&doc, "div", "bar")?;
        let fill = dom::el(&doc, "i", "")?;
        bar.append_child(&fill)?;
        inner.append_child(&bar)?;
        pre.append_child(&inner)?;
        body.append_child(&pre)?;

        // Probe everything under one progress bar
        let assets = &tuning.assets;
        let mut candidates: Vec<(String, AssetKind)> = assets
            .background_candidates
            .iter()
            .map(|uri| (uri.clone(), AssetKind::Image))
            .collect();
        let bg_count = candidates.len();
        candidates.push((assets.heart_sprite.clone(), AssetKind::Image));
        candidates.push((assets.confetti_sprite.clone(), AssetKind::Image));
        for track in Track::ALL {
            candidates.push((track.uri(assets).to_string(), AssetKind::Audio));
        }

        let resolver = AssetResolver::new(WebProbe, assets);
        let progress = fill.clone();
        let mut descriptors = resolver
            .probe_all(&candidates, move |settled, total| {
                let pct = settled * 100 / total.max(1);
                let _ = progress.style().set_property("width", &format!("{}%", pct));
            })
            .await;

        let audio_desc = descriptors.split_off(bg_count + 2);
        let sprite_desc = descriptors.split_off(bg_count);
        let backgrounds = choose_backgrounds(&resolver, descriptors, &mut rng);

        let confirmed = |d: &AssetDescriptor| d.status() == AssetStatus::Confirmed;
        let heart_src = match sprite_desc.first() {
            Some(d) if confirmed(d) => d.uri.clone(),
            _ => resolver.fallback().heart_sprite().data_url(),
        };
        let confetti = match sprite_desc.get(1) {
            Some(d) if confirmed(d) => Some(image(&d.uri)?),
            _ => None,
        };
        let sprites = Sprites {
            heart: image(&heart_src)?,
            confetti,
        };

        let audio_assets = resolver.substitute(audio_desc, &mut rng);
        let audio = AudioManager::new(TrackSet::from_resolved(&audio_assets, assets), &settings);

        pre.remove();

        // Particle overlay
        let (fx_canvas, fx) = dom::canvas(&doc, "")?;
        fx_canvas.set_id("fx");
        let viewport = dom::viewport();
        fx_canvas.set_width(viewport.x as u32);
        fx_canvas.set_height(viewport.y as u32);
        body.append_child(&fx_canvas)?;

        let mailbox: Mailbox = Rc::new(RefCell::new(VecDeque::new()));
        setup_input_handlers(&doc, &mailbox)?;

        let particles = ParticleSystem::new(&tuning.particles, settings.max_particles());
        let secret = SecretKnock::new(tuning.intro.secret_window_ms);
        let app = Rc::new(RefCell::new(App {
            doc,
            tuning,
            content,
            settings,
            rng,
            flow: Flow::new(),
            scenes: SceneManager::new(DomHost::body()?),
            mailbox,
            audio,
            backgrounds,
            sprites,
            particles,
            fx_canvas,
            fx,
            levels: Vec::new(),
            view: View::None,
            pending_balloons: None,
            pending_memory: None,
            secret,
            viewport,
            accumulator: 0.0,
            last_time: 0.0,
        }));

        app.borrow_mut().enter(SceneTag::Intro)?;
        request_animation_frame(app);

        log::info!("Proposal Stage running!");
        Ok(())
    }

    /// Confirmed originals, or procedural fallbacks if none loaded
    fn choose_backgrounds(
        resolver: &AssetResolver<WebProbe>,
        descriptors: Vec<AssetDescriptor>,
        rng: &mut Pcg32,
    ) -> Vec<String> {
        let originals: Vec<String> = descriptors
            .iter()
            .filter(|d| d.status() == AssetStatus::Confirmed)
            .map(|d| d.uri.clone())
            .collect();
        if !originals.is_empty() {
            log::info!("{} background(s) found", originals.len());
            return originals;
        }
        log::warn!("No background images found, generating procedural fallbacks");
        background_sources(&resolver.substitute(descriptors, rng))
    }

    fn setup_input_handlers(doc: &Document, mailbox: &Mailbox) -> Result<(), PlatformError> {
        // Delegated clicks
        {
            let mailbox = mailbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok())
                else {
                    return;
                };
                if let Some(input) = click_input(&target) {
                    mailbox.borrow_mut().push_back(input);
                }
            });
            doc.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Pointer move (evasion, parallax)
        {
            let mailbox = mailbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let p = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let mut queue = mailbox.borrow_mut();
                // Only the latest position matters
                if let Some(Input::PointerMove(last)) = queue.back_mut() {
                    *last = p;
                } else {
                    queue.push_back(Input::PointerMove(p));
                }
            });
            doc.add_event_listener_with_callback(
                "pointermove",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Pointer down (ring catch, secret taps, audio unlock)
        {
            let mailbox = mailbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let p = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                mailbox.borrow_mut().push_back(Input::PointerDown(p));
            });
            doc.add_event_listener_with_callback(
                "pointerdown",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Touch start (evasion, swipe start)
        {
            let mailbox = mailbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    let p = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                    mailbox.borrow_mut().push_back(Input::TouchStart(p));
                }
            });
            doc.add_event_listener_with_callback(
                "touchstart",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Touch end (swipe)
        {
            let mailbox = mailbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.changed_touches().get(0) {
                    mailbox
                        .borrow_mut()
                        .push_back(Input::TouchEnd(touch.client_x() as f32));
                }
            });
            doc.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Proposal Stage (native) starting...");
    log::info!("The experience runs in the browser, build for wasm32-unknown-unknown to play it");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Synthesize a fallback and play a scripted ring chase without a browser
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use glam::Vec2;
    use proposal_stage::assets::FallbackGenerator;
    use proposal_stage::scene::{Action, Flow};
    use proposal_stage::sim::{CatchOutcome, ParticleSystem, Ring, RingEvent};
    use proposal_stage::{Settings, Tuning};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    let tuning = Tuning::default();
    let mut rng = Pcg32::seed_from_u64(7);

    let generator = FallbackGenerator::from_tuning(&tuning.assets);
    let background = generator.background(0.0, &mut rng);
    println!(
        "Fallback background: {}x{}, {} bytes of PNG",
        background.width,
        background.height,
        background.png.len()
    );

    let mut flow = Flow::new();
    flow.apply(Action::Continue);
    flow.apply(Action::Accept);

    let arena = Vec2::new(1200.0, 800.0);
    let mut ring = Ring::new(&tuning.ring, arena, &mut rng);
    let mut particles = ParticleSystem::new(&tuning.particles, Settings::default().max_particles());

    for tick in 0u32.. {
        if tick == 120 && ring.try_catch(ring.rect().center()) == CatchOutcome::Caught {
            particles.spawn(ring.rect().center(), tuning.ring.catch_burst, &mut rng);
            println!("Caught the ring at tick {}", tick);
        }
        particles.tick();
        match ring.tick(&mut rng) {
            Some(RingEvent::Completed) => {
                flow.apply(Action::RingCaught);
                break;
            }
            Some(RingEvent::Escaped) => {
                flow.apply(Action::RingEscaped);
                break;
            }
            None => {}
        }
    }

    println!(
        "Scene: {}, {} particles still in flight",
        flow.current().as_str(),
        particles.active_count()
    );
}
