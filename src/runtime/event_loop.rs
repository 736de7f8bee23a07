use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::audio::AudioBackend;
use crate::events::Event;
use crate::library::{display_from_fields, format_duration};
use crate::session::{Command, Session};

use super::console::{self, ConsoleCommand, HELP};

/// How long to wait for input before servicing the session again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Main console loop: feeds input lines to the session, services pending work
/// and prints events. Returns when `quit` is entered or input closes.
pub fn run<B: AudioBackend, W: Write>(
    session: &mut Session<B>,
    input: &Receiver<String>,
    events: &Receiver<Event>,
    out: &mut W,
) -> anyhow::Result<()> {
    loop {
        let flow = match input.recv_timeout(POLL_INTERVAL) {
            Ok(line) => handle_line(session, &line, out)?,
            Err(RecvTimeoutError::Timeout) => Flow::Continue,
            Err(RecvTimeoutError::Disconnected) => Flow::Quit,
        };

        session.process_pending();
        print_events(events, out)?;

        if flow == Flow::Quit {
            return Ok(());
        }
    }
}

/// Print every queued event that has a console line.
pub fn print_events<W: Write>(events: &Receiver<Event>, out: &mut W) -> std::io::Result<()> {
    for event in events.try_iter() {
        if let Some(line) = console::describe_event(&event) {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}

/// Parse and run one console line.
pub fn handle_line<B: AudioBackend, W: Write>(
    session: &mut Session<B>,
    line: &str,
    out: &mut W,
) -> std::io::Result<Flow> {
    match console::parse(line) {
        Ok(Some(cmd)) => execute(session, cmd, out),
        Ok(None) => Ok(Flow::Continue),
        Err(msg) => {
            writeln!(out, "{msg}")?;
            Ok(Flow::Continue)
        }
    }
}

fn execute<B: AudioBackend, W: Write>(
    session: &mut Session<B>,
    cmd: ConsoleCommand,
    out: &mut W,
) -> std::io::Result<Flow> {
    let command = match cmd {
        ConsoleCommand::Scan(dir) => Command::Scan(dir),
        ConsoleCommand::Group(n) => Command::LoadGroup(n),
        ConsoleCommand::Pause => Command::Pause,
        ConsoleCommand::Stop => Command::Stop,
        ConsoleCommand::Toggle => Command::TogglePlayPause,
        ConsoleCommand::Next => Command::Next,
        ConsoleCommand::Prev => Command::Previous,
        ConsoleCommand::Seek(to) => Command::Seek(to),
        ConsoleCommand::Volume(v) => Command::SetVolume(v),
        ConsoleCommand::Shuffle => Command::ToggleShuffle,
        ConsoleCommand::Loop => Command::ToggleLoop,
        ConsoleCommand::Play(n) => {
            if !session.play_index(n) {
                writeln!(out, "cannot play entry {}", n + 1)?;
            }
            return Ok(Flow::Continue);
        }
        ConsoleCommand::List => {
            list_queue(session, out)?;
            return Ok(Flow::Continue);
        }
        ConsoleCommand::Groups => {
            for (i, g) in session.groups().iter().enumerate() {
                let total = g.formatted_duration();
                writeln!(out, "{:>3}. {} ({} tracks, {total})", i + 1, g.name, g.len())?;
            }
            return Ok(Flow::Continue);
        }
        ConsoleCommand::Playlists => {
            let lists = session.playlists();
            if lists.is_empty() {
                writeln!(out, "no playlists")?;
            }
            for p in lists.all() {
                let total = p.formatted_duration();
                writeln!(out, "  {} ({} tracks, {total})", p.name, p.len())?;
            }
            return Ok(Flow::Continue);
        }
        ConsoleCommand::NewPlaylist(name) => {
            if let Err(e) = session.create_playlist(&name, Vec::new()) {
                writeln!(out, "{e}")?;
            }
            return Ok(Flow::Continue);
        }
        ConsoleCommand::AddToPlaylist(n, name) => {
            let Some(track) = session.queue().get(n).cloned() else {
                writeln!(out, "no queue entry {}", n + 1)?;
                return Ok(Flow::Continue);
            };
            match session.add_to_playlist(&name, track) {
                Ok(true) => {}
                Ok(false) => writeln!(out, "already in {name}")?,
                Err(e) => writeln!(out, "{e}")?,
            }
            return Ok(Flow::Continue);
        }
        ConsoleCommand::RemoveFromPlaylist(n, name) => {
            let Some(track) = session.queue().get(n).cloned() else {
                writeln!(out, "no queue entry {}", n + 1)?;
                return Ok(Flow::Continue);
            };
            Command::RemoveFromPlaylist { name, track }
        }
        ConsoleCommand::DeletePlaylist(name) => Command::DeletePlaylist(name),
        ConsoleCommand::LoadPlaylist(name) => Command::LoadPlaylist(name),
        ConsoleCommand::Find(term) => {
            let hits = session.search(&term);
            for t in &hits {
                writeln!(out, "  {} - {} [{}]", t.artist, t.title, t.genre)?;
            }
            writeln!(out, "{} match(es)", hits.len())?;
            return Ok(Flow::Continue);
        }
        ConsoleCommand::Stats => {
            let s = session.stats();
            writeln!(
                out,
                "{} tracks, {} artists, {} genres, {} groups, {} total",
                s.tracks,
                s.artists,
                s.genres,
                s.groups,
                format_duration(s.total_duration)
            )?;
            return Ok(Flow::Continue);
        }
        ConsoleCommand::Now => {
            now_playing(session, out)?;
            return Ok(Flow::Continue);
        }
        ConsoleCommand::Save => {
            let msg = if session.save_preferences() {
                "preferences saved"
            } else {
                "preferences not saved"
            };
            writeln!(out, "{msg}")?;
            return Ok(Flow::Continue);
        }
        ConsoleCommand::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(Flow::Continue);
        }
        ConsoleCommand::Quit => return Ok(Flow::Quit),
    };

    if !session.handle(command) {
        writeln!(out, "not now")?;
    }
    Ok(Flow::Continue)
}

fn list_queue<B: AudioBackend, W: Write>(
    session: &Session<B>,
    out: &mut W,
) -> std::io::Result<()> {
    let queue = session.queue();
    if queue.is_empty() {
        return writeln!(out, "queue is empty");
    }
    let lib = &session.settings().library;
    for (i, t) in queue.tracks().iter().enumerate() {
        let marker = if queue.index() == Some(i) { '>' } else { ' ' };
        let name = display_from_fields(t, &lib.display_fields, &lib.display_separator);
        writeln!(out, "{marker}{:>4}. {name} ({})", i + 1, format_duration(t.duration))?;
    }
    Ok(())
}

fn now_playing<B: AudioBackend, W: Write>(
    session: &Session<B>,
    out: &mut W,
) -> std::io::Result<()> {
    let engine = session.engine();
    let Some(t) = engine.current_track() else {
        return writeln!(out, "nothing loaded");
    };
    let queue = session.queue();
    writeln!(
        out,
        "{} - {} [{:?}] {} / {}  vol {:.0}%  shuffle {}  loop {}",
        t.artist,
        t.title,
        engine.state(),
        format_duration(engine.position()),
        format_duration(engine.total_duration()),
        engine.volume() * 100.0,
        if queue.shuffle() { "on" } else { "off" },
        if queue.loop_enabled() { "on" } else { "off" },
    )
}
