//! Console front end: wires settings, logging, the audio device and a
//! `Session` to stdin/stdout.

use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use tracing::info;

use crate::audio::RodioBackend;
use crate::session::Session;

pub mod console;
mod event_loop;
mod settings;

pub use event_loop::{Flow, handle_line, print_events};

pub fn run() -> anyhow::Result<()> {
    let settings = settings::load_settings();
    let dir = env::args_os().nth(1).map(PathBuf::from);

    let backend = RodioBackend::open_default().context("opening the audio output device")?;
    let mut session = Session::new(backend, settings);
    let events = session.events().subscribe_all();

    if let Some(dir) = &dir {
        session.scan(dir);
    }

    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("groove-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("starting the input reader")?;

    println!("groove: type \"help\" for commands");
    let mut stdout = io::stdout();
    let result = event_loop::run(&mut session, &line_rx, &events, &mut stdout);

    session.shutdown();
    info!("bye");
    result
}
