//! Terminal-Oberfläche
//!
//! Zeigt den Button als Textzeile und liest Befehle zeilenweise:
//! leere Zeile oder `press` drückt den Button, `quit` beendet.
//! Bei jedem Statuswechsel wird neu gezeichnet.

use super::shell::CallShell;
use crate::call::CallEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;

/// Startet die Eingabeschleife bis `quit` oder Ende der Eingabe
pub async fn run_terminal<R, W>(shell: &CallShell, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = shell.manager().subscribe();
    let mut lines = input.lines();

    render(shell, &mut output).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                match line.trim() {
                    "quit" | "q" | "exit" => break,
                    "" | "press" | "p" => {
                        press(shell, &mut events, &mut output).await?;
                        render(shell, &mut output).await?;
                    }
                    other => {
                        output
                            .write_all(format!("Unknown command: {other}\n").as_bytes())
                            .await?;
                    }
                }
            }
            event = events.recv() => {
                if let Ok(CallEvent::StateChanged(_)) = event {
                    render(shell, &mut output).await?;
                }
            }
        }
    }

    output.flush().await
}

/// Drückt den Button und zeichnet Zwischenstände, solange die Aktion läuft
async fn press<W>(
    shell: &CallShell,
    events: &mut broadcast::Receiver<CallEvent>,
    output: &mut W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let action = shell.press();
    tokio::pin!(action);

    loop {
        tokio::select! {
            result = &mut action => {
                if let Err(e) = result {
                    output.write_all(format!("Error: {e}\n").as_bytes()).await?;
                }
                return Ok(());
            }
            event = events.recv() => {
                match event {
                    Ok(CallEvent::StateChanged(_)) => render(shell, output).await?,
                    Ok(CallEvent::Error(message)) => {
                        output.write_all(format!("Error: {message}\n").as_bytes()).await?;
                    }
                    Err(_) => {}
                }
            }
        }
    }
}

async fn render<W>(shell: &CallShell, output: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{}\n", shell.view()).as_bytes())
        .await?;
    output.flush().await
}
