use std::io::{self, Write};

use crate::stopwatch::{Frame, NO_LAPS};
use crate::theme::Theme;

const CLEAR: &str = "\x1b[2J\x1b[H";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const MAX_VISIBLE_LAPS: usize = 15;

fn palette(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "\x1b[48;5;255m\x1b[38;5;235m",
        Theme::Dark => "\x1b[48;5;236m\x1b[38;5;252m",
    }
}

fn control(out: &mut impl Write, label: &str, enabled: bool, colors: &str) -> io::Result<()> {
    if enabled {
        write!(out, "[{}{}{}{}] ", BOLD, label, RESET, colors)
    } else {
        write!(out, "[{}{}{}{}] ", DIM, label, RESET, colors)
    }
}

pub fn draw_stopwatch(out: &mut impl Write, frame: &Frame) -> io::Result<()> {
    let colors = palette(frame.theme);
    // Background first so the clear paints the whole screen in the theme
    write!(out, "{}{}", colors, CLEAR)?;

    writeln!(out, "{}STOPWATCH{}{}  ({} theme)", BOLD, RESET, colors, frame.theme.as_str())?;
    writeln!(out)?;
    writeln!(out, "    {}{}{}{}", BOLD, frame.time, RESET, colors)?;
    writeln!(out)?;

    write!(out, "  ")?;
    control(out, "start", frame.start_enabled, colors)?;
    control(out, "stop", frame.stop_enabled, colors)?;
    control(out, "lap", frame.lap_enabled, colors)?;
    control(out, "reset", true, colors)?;
    writeln!(out)?;
    writeln!(out)?;

    if frame.laps.is_empty() {
        writeln!(out, "  {}{}{}{}", DIM, NO_LAPS, RESET, colors)?;
    } else {
        let hidden = frame.laps.len().saturating_sub(MAX_VISIBLE_LAPS);
        if hidden > 0 {
            writeln!(out, "  {}... {} earlier{}{}", DIM, hidden, RESET, colors)?;
        }
        for lap in &frame.laps[hidden..] {
            writeln!(out, "  {}", lap)?;
        }
    }

    writeln!(out)?;
    if frame.show_help {
        writeln!(out, "{}Keyboard Shortcuts:{}{}", BOLD, RESET, colors)?;
        writeln!(out, "  Space: Start/Stop")?;
        writeln!(out, "  R: Reset")?;
        writeln!(out, "  L: Lap")?;
        writeln!(out, "  T: Theme")?;
        writeln!(out, "  Q: Quit")?;
        writeln!(out, "{}(type a key, then Enter){}{}", DIM, RESET, colors)?;
    } else {
        writeln!(out, "{}space=start/stop  r=reset  l=lap  t=theme  q=quit{}{}", DIM, RESET, colors)?;
    }
    write!(out, "{}", RESET)?;
    out.flush()
}

/// Restore the terminal on exit.
pub fn clear_screen(out: &mut impl Write) -> io::Result<()> {
    write!(out, "{}{}", RESET, CLEAR)?;
    out.flush()
}
