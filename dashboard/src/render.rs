use crate::errors::Result;
use crate::projection::{ChartPoint, DashboardView};
use crate::state::Snapshot;
use clap::ValueEnum;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;
use tokio::sync::watch;
use tracing::{error, info};

const BAR_WIDTH: usize = 30;
const BAR_CHAR: char = '█';

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn render(view: &DashboardView, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(view)),
        OutputFormat::Json => Ok(serde_json::to_string(view)?),
    }
}

/// Cards, trend chart and history as plain terminal text.
pub fn render_text(view: &DashboardView) -> String {
    let mut lines = vec!["Monitoramento de Água".to_string()];

    if let Some(updated_at) = view.updated_at {
        lines.push(format!(
            "Atualizado em {}",
            updated_at.format("%d/%m/%Y %H:%M:%S")
        ));
    }

    if view.loading {
        lines.push("Carregando...".to_string());
        return lines.join("\n");
    }

    if let Some(message) = view.error {
        lines.push(format!("! {}", message));
    }

    lines.push(String::new());
    lines.extend(render_cards(view));
    lines.push(String::new());
    lines.extend(render_chart(&view.chart));
    lines.push(String::new());
    lines.extend(render_history(view));

    lines.join("\n")
}

fn render_cards(view: &DashboardView) -> Vec<String> {
    let (value, status) = match &view.latest {
        Some(latest) => (format!("{:.2}", latest.leitura), latest.status.as_str()),
        None => ("--".to_string(), "--"),
    };

    vec![
        format!("Última leitura : {}", value),
        format!("Status         : {}", status),
        format!("Média          : {}", view.average),
        format!("Bomba          : {}", view.pump),
        format!("Leituras       : {}", view.count),
    ]
}

fn render_chart(points: &[ChartPoint]) -> Vec<String> {
    let mut lines = vec!["Tendência".to_string()];
    if points.is_empty() {
        lines.push("  sem dados".to_string());
        return lines;
    }

    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    for point in points {
        lines.push(format!(
            "  {:>8} {:<width$} {:.2}",
            point.label,
            bar(point.value, max),
            point.value,
            width = BAR_WIDTH
        ));
    }
    lines
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    std::iter::repeat(BAR_CHAR).take(len.min(BAR_WIDTH)).collect()
}

fn render_history(view: &DashboardView) -> Vec<String> {
    let mut lines = vec!["Histórico".to_string()];
    if view.history.is_empty() {
        lines.push("  sem leituras".to_string());
        return lines;
    }

    for row in &view.history {
        lines.push(format!(
            "  {:<19}  #{:<6} {:>8.2}  {:<10} {}",
            row.timestamp, row.id, row.leitura, row.status, row.pump
        ));
    }
    lines
}

/// Re-renders every snapshot published on `rx` until the sender side closes.
///
/// Each frame is written to `out` and flushed. With `clear` set the screen
/// is wiped and the cursor homed before every frame.
pub async fn run_renderer<W: Write>(
    mut rx: watch::Receiver<Snapshot>,
    format: OutputFormat,
    mut out: W,
    clear: bool,
) {
    info!("Starting renderer with format {:?}", format);

    loop {
        let snapshot = rx.borrow_and_update().clone();
        let view = DashboardView::project(&snapshot);

        match render(&view, format) {
            Ok(output) => {
                if let Err(e) = write_frame(&mut out, &output, clear) {
                    error!("Failed to write dashboard: {}", e);
                    break;
                }
            }
            Err(e) => error!("Failed to render dashboard: {}", e),
        }

        if rx.changed().await.is_err() {
            break;
        }
    }

    info!("Renderer stopped");
}

fn write_frame<W: Write>(out: &mut W, output: &str, clear: bool) -> std::io::Result<()> {
    if clear {
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    }
    writeln!(out, "{}", output)?;
    out.flush()
}
