//! DOM scene host and element helpers

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, Window,
};

use crate::error::PlatformError;
use crate::scene::SceneHost;

pub fn window() -> Result<Window, PlatformError> {
    web_sys::window().ok_or(PlatformError::Missing("window"))
}

pub fn document() -> Result<Document, PlatformError> {
    window()?
        .document()
        .ok_or(PlatformError::Missing("document"))
}

/// Current viewport size in CSS pixels
pub fn viewport() -> Vec2 {
    let Ok(w) = window() else {
        return Vec2::new(1024.0, 768.0);
    };
    let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1024.0);
    let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(768.0);
    Vec2::new(width as f32, height as f32)
}

pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Attaches scene nodes under a single root element
pub struct DomHost {
    root: Element,
}

impl DomHost {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Host rooted at `<body>`
    pub fn body() -> Result<Self, PlatformError> {
        let body = document()?.body().ok_or(PlatformError::Missing("body"))?;
        Ok(Self::new(body.into()))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}

impl SceneHost for DomHost {
    type Node = Element;

    fn attach(&mut self, node: &Element) {
        if let Err(e) = self.root.append_child(node) {
            log::error!("Failed to attach scene: {:?}", e);
        }
    }

    fn detach(&mut self, node: &Element) {
        node.remove();
    }
}

/// `<tag class="...">`
pub fn el(doc: &Document, tag: &str, class: &str) -> Result<HtmlElement, PlatformError> {
    let element: HtmlElement = doc
        .create_element(tag)?
        .dyn_into()
        .map_err(|_| PlatformError::Js(format!("<{}> is not an HtmlElement", tag)))?;
    if !class.is_empty() {
        element.set_class_name(class);
    }
    Ok(element)
}

/// Element with text content
pub fn text(
    doc: &Document,
    tag: &str,
    class: &str,
    content: &str,
) -> Result<HtmlElement, PlatformError> {
    let element = el(doc, tag, class)?;
    element.set_text_content(Some(content));
    Ok(element)
}

/// Button routed through the delegated click handler via `data-action`
pub fn button(
    doc: &Document,
    class: &str,
    action: &str,
    label: &str,
) -> Result<HtmlElement, PlatformError> {
    let b = text(doc, "button", class, label)?;
    b.set_attribute("data-action", action)?;
    Ok(b)
}

/// `<canvas>` with its 2d context
pub fn canvas(
    doc: &Document,
    class: &str,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), PlatformError> {
    let canvas: HtmlCanvasElement = el(doc, "canvas", class)?
        .dyn_into()
        .map_err(|_| PlatformError::Missing("canvas"))?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or(PlatformError::Missing("2d context"))?
        .dyn_into()
        .map_err(|_| PlatformError::Missing("2d context"))?;
    Ok((canvas, ctx))
}

/// Append every child in order
pub fn append_all(parent: &Element, children: &[&HtmlElement]) -> Result<(), PlatformError> {
    for child in children {
        parent.append_child(child)?;
    }
    Ok(())
}

/// Set an absolute position in px
pub fn place(element: &HtmlElement, pos: Vec2) {
    let style = element.style();
    let _ = style.set_property("left", &format!("{:.1}px", pos.x));
    let _ = style.set_property("top", &format!("{:.1}px", pos.y));
}

pub fn inject_styles(doc: &Document) -> Result<(), PlatformError> {
    let style = text(doc, "style", "", STYLES)?;
    doc.head()
        .ok_or(PlatformError::Missing("head"))?
        .append_child(&style)?;
    Ok(())
}

const STYLES: &str = r#"
html,body{margin:0;height:100%;overflow:hidden;font-family:system-ui,sans-serif;color:#04171f;background:#e6fff9}
#fx{position:fixed;inset:0;pointer-events:none;z-index:50}
.preloader{position:fixed;inset:0;display:flex;align-items:center;justify-content:center;background:#f3fffb;z-index:100}
.preloader .bar{width:240px;height:8px;border-radius:4px;background:#d7efe6;margin-top:12px;overflow:hidden}
.preloader .bar i{display:block;height:100%;width:0;background:#2bb39a;transition:width .2s}
.scene{position:fixed;inset:0;display:flex;align-items:center;justify-content:center}
.bg{position:absolute;inset:-10px;background-size:cover;background-position:center;opacity:0;transition:opacity 1.2s}
.bg.visible{opacity:1}
.card{position:relative;max-width:920px;width:min(92%,760px);background:rgba(255,255,255,.9);border-radius:16px;padding:26px 30px;box-shadow:0 6px 40px rgba(4,23,31,.08)}
.title{font-size:26px;margin:0 0 12px}
.para{white-space:pre-wrap;font-size:17px;line-height:1.5;min-height:4em}
.row{display:flex;gap:10px;flex-wrap:wrap;margin-top:14px}
.btn{border:0;border-radius:10px;padding:10px 18px;font-size:16px;cursor:pointer;background:#2bb39a;color:#fff}
.btn.secondary{background:#e1f5ef;color:#04171f}
.btn:disabled{opacity:.5;cursor:default}
.notice{margin-top:12px;font-style:italic;min-height:1.2em}
.evade{position:fixed;z-index:20}
.arena{position:fixed;inset:0;cursor:crosshair}
.ring{position:absolute;left:0;top:0;display:flex;align-items:center;justify-content:center;will-change:transform;user-select:none}
.hud{position:fixed;top:14px;left:50%;transform:translateX(-50%);background:rgba(255,255,255,.85);border-radius:10px;padding:6px 14px;z-index:10}
.board{position:relative;width:min(94%,820px);height:min(80%,620px);background:linear-gradient(180deg,#fff,#f7fffb);border-radius:14px;overflow:hidden;box-shadow:0 6px 40px rgba(4,23,31,.1)}
.balloon{position:absolute;left:0;top:0;border-radius:50%;cursor:pointer;background:radial-gradient(circle at 40% 30%,rgba(255,255,255,.9),rgba(255,255,255,.5)),linear-gradient(180deg,#ff9fb8,#ff5f84);box-shadow:0 6px 18px rgba(0,0,0,.12)}
.cards{display:grid;grid-template-columns:repeat(4,1fr);gap:10px;padding:16px}
.cardface{height:84px;border-radius:10px;border:0;font-size:34px;cursor:pointer;background:#2bb39a;color:transparent}
.cardface.revealed,.cardface.matched{background:#fff;color:#04171f}
.cardface.matched{outline:3px solid #2bb39a}
.reward{margin:8px 16px;min-height:1.4em;font-style:italic}
.visualizer{display:block;width:60%;height:48px;margin:12px auto 0}
"#;
