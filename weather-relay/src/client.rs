//! Interactive terminal client: asks for a city, shows its weather.
//!
//! Talks to a running relay server through [`BackendProvider`] and keeps a
//! session cache via the [`Dispatcher`]. The prompt runs on a blocking thread
//! and feeds lines over a channel, so responses are shown as soon as they
//! arrive and a new city can be typed while the previous one is still loading.

use anyhow::Context;
use inquire::{InquireError, Text};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use weather_core::{
    Dispatcher, Phase, Relay, SearchOutcome, Update, WeatherView, provider::backend::BackendProvider,
};

/// One event from the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Quit,
}

pub async fn run(server: &str, location: Option<(f64, f64)>) -> anyhow::Result<()> {
    let provider = BackendProvider::new(server)?;
    let mut dispatcher = Dispatcher::new(Relay::new(Arc::new(provider)));

    if let Some((lat, lon)) = location {
        dispatcher.locate(lat, lon)?;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let prompt = tokio::task::spawn_blocking(move || read_lines(tx));

    drive(&mut dispatcher, rx, &mut std::io::stdout()).await?;
    prompt.await.context("Prompt task failed")?;
    Ok(())
}

/// Feed prompt answers into `tx` until the user quits or the receiver is gone.
fn read_lines(tx: mpsc::UnboundedSender<Input>) {
    loop {
        let input = match Text::new("Enter City:")
            .with_placeholder("Enter a city name")
            .prompt()
        {
            Ok(line) => Input::Line(line),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Input::Quit,
            Err(err) => {
                warn!(error = %err, "failed to read city name");
                Input::Quit
            }
        };
        let quit = input == Input::Quit;
        if tx.send(input).is_err() || quit {
            break;
        }
    }
}

/// Apply prompt input and render completions as they happen.
///
/// Returns on [`Input::Quit`], cancelling whatever is still in flight. If the
/// input side closes instead, outstanding requests are allowed to finish.
pub async fn drive<W: Write>(
    dispatcher: &mut Dispatcher,
    mut inputs: mpsc::UnboundedReceiver<Input>,
    out: &mut W,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            input = inputs.recv() => match input {
                Some(Input::Line(line)) => submit(dispatcher, &line, out)?,
                Some(Input::Quit) => {
                    dispatcher.shutdown();
                    return Ok(());
                }
                None => break,
            },
            Some(update) = dispatcher.next_update(), if dispatcher.has_pending() => {
                render(dispatcher, update, out)?;
            }
        }
    }

    while let Some(update) = dispatcher.next_update().await {
        render(dispatcher, update, out)?;
    }
    Ok(())
}

fn submit<W: Write>(dispatcher: &mut Dispatcher, line: &str, out: &mut W) -> anyhow::Result<()> {
    match dispatcher.search(line) {
        SearchOutcome::Started => writeln!(out, "Loading weather data...")?,
        SearchOutcome::AlreadyPending => {}
        SearchOutcome::Rejected | SearchOutcome::Cached => write_phase(out, dispatcher.phase())?,
    }
    out.flush()?;
    Ok(())
}

fn render<W: Write>(dispatcher: &Dispatcher, update: Update, out: &mut W) -> anyhow::Result<()> {
    match update {
        Update::Place => write_phase(out, dispatcher.phase())?,
        Update::Location => write_location(out, dispatcher)?,
    }
    out.flush()?;
    Ok(())
}

fn write_phase<W: Write>(out: &mut W, phase: &Phase) -> std::io::Result<()> {
    match phase {
        Phase::Idle | Phase::Pending { .. } => Ok(()),
        Phase::Success { key, result } => writeln!(out, "{}\n", WeatherView::from_result(result, key)),
        Phase::Failed(message) => writeln!(out, "{message}\n"),
    }
}

fn write_location<W: Write>(out: &mut W, dispatcher: &Dispatcher) -> std::io::Result<()> {
    match dispatcher.current_location() {
        Some(result) => writeln!(
            out,
            "{}\n",
            WeatherView::from_result(result, "your location").render_current_location()
        ),
        None => Ok(()),
    }
}
