// Terminal session handling

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use std::io::{self, Stdout, Write};

/// Size assumed when stdout is not a terminal
const FALLBACK_SIZE: (usize, usize) = (80, 24);

/// Current terminal size as (columns, lines)
pub fn size() -> (usize, usize) {
    match crossterm::terminal::size() {
        Ok((columns, lines)) if columns > 0 && lines > 0 => (columns as usize, lines as usize),
        _ => FALLBACK_SIZE,
    }
}

/// Clear the screen and home the cursor
pub fn clear<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// Alternate screen held for as long as this guard lives.
/// Dropping it restores the original screen and cursor, including when
/// the monitor unwinds with an error.
pub struct AlternateScreen<W: Write = Stdout> {
    out: W,
}

impl AlternateScreen<Stdout> {
    pub fn enter() -> Result<Self> {
        Self::enter_on(io::stdout())
    }
}

impl<W: Write> AlternateScreen<W> {
    pub fn enter_on(mut out: W) -> Result<Self> {
        execute!(out, EnterAlternateScreen, Hide)
            .context("Failed to switch to the alternate screen")?;
        log::debug!("Entered alternate screen");
        Ok(Self { out })
    }
}

impl<W: Write> Drop for AlternateScreen<W> {
    fn drop(&mut self) {
        match execute!(self.out, Show, LeaveAlternateScreen) {
            Ok(()) => log::debug!("Left alternate screen"),
            Err(e) => log::warn!("Failed to restore the terminal: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ENTER: &str = "\x1b[?1049h";
    const LEAVE: &str = "\x1b[?1049l";

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_guard_restores_screen_on_drop() {
        let buf = SharedBuf::default();

        let guard = AlternateScreen::enter_on(buf.clone()).unwrap();
        assert!(buf.contents().contains(ENTER));
        assert!(!buf.contents().contains(LEAVE));

        drop(guard);
        let out = buf.contents();
        assert!(out.contains(LEAVE));
        assert!(out.find(ENTER) < out.find(LEAVE));
    }

    #[test]
    fn test_guard_restores_screen_on_error() {
        let buf = SharedBuf::default();

        let run = || -> Result<()> {
            let _screen = AlternateScreen::enter_on(buf.clone())?;
            anyhow::bail!("tmutil status -X failed");
        };

        assert!(run().is_err());
        assert!(buf.contents().contains(LEAVE));
    }

    #[test]
    fn test_clear_homes_cursor() {
        let mut out = Vec::new();
        clear(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\x1b[2J"));
        assert!(out.ends_with("\x1b[1;1H"));
    }
}
