/// Reveals text one character at a time, pausing longer at line breaks
#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    /// Byte offset of the revealed prefix (always a char boundary)
    shown: usize,
    budget_ms: f64,
    ms_per_char: f64,
    line_pause_ms: f64,
}

impl Typewriter {
    pub fn new(text: impl Into<String>, ms_per_char: u32, line_pause_factor: u32) -> Self {
        let ms_per_char = f64::from(ms_per_char.max(1));
        Self {
            text: text.into(),
            shown: 0,
            budget_ms: 0.0,
            ms_per_char,
            line_pause_ms: ms_per_char * f64::from(line_pause_factor.max(1)),
        }
    }

    /// Spend `elapsed_ms` revealing characters. Returns whether anything new
    /// became visible.
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        if self.is_done() {
            return false;
        }
        self.budget_ms += elapsed_ms.max(0.0);
        let before = self.shown;
        while let Some(c) = self.text[self.shown..].chars().next() {
            let cost = if c == '\n' {
                self.line_pause_ms
            } else {
                self.ms_per_char
            };
            if self.budget_ms < cost {
                break;
            }
            self.budget_ms -= cost;
            self.shown += c.len_utf8();
        }
        if self.is_done() {
            self.budget_ms = 0.0;
        }
        self.shown != before
    }

    /// Reveal everything at once
    pub fn skip(&mut self) {
        self.shown = self.text.len();
        self.budget_ms = 0.0;
    }

    pub fn visible(&self) -> &str {
        &self.text[..self.shown]
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveals_per_char() {
        let mut tw = Typewriter::new("hello", 26, 6);
        assert_eq!(tw.visible(), "");
        assert!(tw.advance(26.0 * 2.0));
        assert_eq!(tw.visible(), "he");
        assert!(!tw.advance(10.0));
        assert!(tw.advance(16.0));
        assert_eq!(tw.visible(), "hel");
    }

    #[test]
    fn test_line_break_pauses() {
        let mut tw = Typewriter::new("a\nb", 10, 6);
        tw.advance(10.0);
        assert_eq!(tw.visible(), "a");
        tw.advance(50.0);
        assert_eq!(tw.visible(), "a");
        tw.advance(10.0);
        assert_eq!(tw.visible(), "a\n");
        tw.advance(10.0);
        assert!(tw.is_done());
    }

    #[test]
    fn test_multibyte_boundaries() {
        let mut tw = Typewriter::new("❤️ok", 1, 1);
        for _ in 0..4 {
            tw.advance(1.0);
            assert!(tw.text.is_char_boundary(tw.visible().len()));
        }
        assert!(tw.is_done());
    }

    #[test]
    fn test_skip_shows_all() {
        let mut tw = Typewriter::new("Dear you,\nhello", 26, 6);
        tw.advance(30.0);
        tw.skip();
        assert!(tw.is_done());
        assert_eq!(tw.visible(), "Dear you,\nhello");
        assert!(!tw.advance(1_000.0));
    }
}
