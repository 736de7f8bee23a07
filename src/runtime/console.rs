//! Line commands read from stdin and the lines printed for events.

use std::path::PathBuf;
use std::time::Duration;

use crate::events::Event;
use crate::library::{format_bpm, format_duration};
use crate::session::Seek;

pub const HELP: &str = "\
commands:
  scan <dir>          scan a directory
  list                show the queue
  groups              show the groups
  group <n>           make group n the queue
  play <n>            play queue entry n
  pause | stop | toggle
  next | prev
  seek <secs>|<pct>%  jump within the track
  vol <0..1>          set the volume
  shuffle | loop      toggle a mode
  find <term>         search the library
  playlists           show your playlists
  mkpl <name>         create an empty playlist
  addpl <n> <name>    add queue entry n to a playlist
  rmpl <n> <name>     remove queue entry n from a playlist
  delpl <name>        delete a playlist
  pl <name>           make a playlist the queue
  stats | now | save
  quit";

/// One parsed console line. Entry numbers are 1-based on the console and
/// 0-based here.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Scan(PathBuf),
    List,
    Groups,
    Group(usize),
    Play(usize),
    Pause,
    Stop,
    Toggle,
    Next,
    Prev,
    Seek(Seek),
    Volume(f32),
    Shuffle,
    Loop,
    Find(String),
    Playlists,
    NewPlaylist(String),
    AddToPlaylist(usize, String),
    RemoveFromPlaylist(usize, String),
    DeletePlaylist(String),
    LoadPlaylist(String),
    Stats,
    Now,
    Save,
    Help,
    Quit,
}

/// Parse a console line. `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "scan" => ConsoleCommand::Scan(PathBuf::from(required(rest, "scan <dir>")?)),
        "list" | "ls" => ConsoleCommand::List,
        "groups" => ConsoleCommand::Groups,
        "group" => ConsoleCommand::Group(entry_number(rest, "group <n>")?),
        "play" => ConsoleCommand::Play(entry_number(rest, "play <n>")?),
        "pause" => ConsoleCommand::Pause,
        "stop" => ConsoleCommand::Stop,
        "toggle" | "p" => ConsoleCommand::Toggle,
        "next" | "n" => ConsoleCommand::Next,
        "prev" | "previous" => ConsoleCommand::Prev,
        "seek" => ConsoleCommand::Seek(parse_seek(required(rest, "seek <secs>|<pct>%")?)?),
        "vol" | "volume" => {
            let v = required(rest, "vol <0..1>")?;
            let v: f32 = v.parse().map_err(|_| format!("not a volume: {v}"))?;
            if !v.is_finite() {
                return Err(format!("not a volume: {rest}"));
            }
            ConsoleCommand::Volume(v)
        }
        "shuffle" => ConsoleCommand::Shuffle,
        "loop" => ConsoleCommand::Loop,
        "find" | "search" => ConsoleCommand::Find(rest.to_string()),
        "playlists" | "pls" => ConsoleCommand::Playlists,
        "mkpl" => ConsoleCommand::NewPlaylist(required(rest, "mkpl <name>")?.to_string()),
        "addpl" => {
            let (n, name) = entry_and_name(rest, "addpl <n> <name>")?;
            ConsoleCommand::AddToPlaylist(n, name)
        }
        "rmpl" => {
            let (n, name) = entry_and_name(rest, "rmpl <n> <name>")?;
            ConsoleCommand::RemoveFromPlaylist(n, name)
        }
        "delpl" => ConsoleCommand::DeletePlaylist(required(rest, "delpl <name>")?.to_string()),
        "pl" => ConsoleCommand::LoadPlaylist(required(rest, "pl <name>")?.to_string()),
        "stats" => ConsoleCommand::Stats,
        "now" => ConsoleCommand::Now,
        "save" => ConsoleCommand::Save,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command: {other} (try \"help\")")),
    };
    Ok(Some(cmd))
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest)
    }
}

fn entry_number(rest: &str, usage: &str) -> Result<usize, String> {
    let raw = required(rest, usage)?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("not an entry number: {raw}")),
    }
}

fn entry_and_name(rest: &str, usage: &str) -> Result<(usize, String), String> {
    let (n, name) = required(rest, usage)?
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("usage: {usage}"))?;
    Ok((entry_number(n, usage)?, name.trim().to_string()))
}

fn parse_seek(raw: &str) -> Result<Seek, String> {
    if let Some(pct) = raw.strip_suffix('%') {
        let pct: f64 = pct
            .trim()
            .parse()
            .map_err(|_| format!("not a percentage: {raw}"))?;
        if !pct.is_finite() {
            return Err(format!("not a percentage: {raw}"));
        }
        return Ok(Seek::Percent(pct));
    }
    let secs: f64 = raw.parse().map_err(|_| format!("not a position: {raw}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("not a position: {raw}"));
    }
    Ok(Seek::To(Duration::from_secs_f64(secs)))
}

/// The line printed for an event; `None` for events too chatty to print.
pub fn describe_event(event: &Event) -> Option<String> {
    let line = match event {
        Event::TrackChanged(Some(track)) => format!(
            "now loaded: {} - {} [{}, {}]",
            track.artist,
            track.title,
            format_duration(track.duration),
            format_bpm(track.bpm)
        ),
        Event::TrackChanged(None) => "track cleared".to_string(),
        Event::PlaybackStarted => "playing".to_string(),
        Event::PlaybackPaused => "paused".to_string(),
        Event::PlaybackStopped => "stopped".to_string(),
        Event::SongEnded(track) => format!("song ended: {}", track.title),
        Event::PositionChanged(_) => return None,
        Event::ScanProgress(p) => {
            if p.processed != p.total && p.processed % 25 != 0 {
                return None;
            }
            format!("scanning {:.0}% ({}/{})", p.percent, p.processed, p.total)
        }
        Event::ScanStatus(msg) => msg.clone(),
        Event::ScanFinished { tracks } => format!("library: {tracks} tracks"),
        Event::GroupsChanged { count } => format!("groups: {count}"),
        Event::PlaylistsChanged { count } => format!("playlists: {count}"),
        Event::ShuffleChanged(on) => format!("shuffle {}", on_off(*on)),
        Event::LoopChanged(on) => format!("loop {}", on_off(*on)),
        Event::VolumeChanged(v) => format!("volume {:.0}%", v * 100.0),
    };
    Some(line)
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
