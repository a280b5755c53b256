use super::ui;
use crate::core::config::DisplayConfig;
use crate::core::price::PriceError;
use crate::core::ticker::Ticker;
use crate::quotes::PriceService;
use anyhow::{Result, anyhow};
use comfy_table::{Cell, Color};

/// Outcome of one requested symbol, in request order.
pub enum PriceRow {
    Quote { ticker: Ticker, price: f64 },
    Failed { ticker: Ticker, error: PriceError },
    Invalid { input: String, reason: String },
}

pub async fn resolve_rows(prices: &PriceService, inputs: &[String]) -> Vec<PriceRow> {
    let parsed: Vec<Result<Ticker, String>> = inputs
        .iter()
        .map(|input| Ticker::parse(input).map_err(|e| e.to_string()))
        .collect();
    let tickers: Vec<Ticker> = parsed.iter().filter_map(|p| p.as_ref().ok().cloned()).collect();

    let pb = ui::new_progress_bar(tickers.len() as u64, true);
    pb.set_message("Fetching prices...");
    let mut results = prices.resolve_all(&tickers, &|| pb.inc(1)).await.into_iter();
    pb.finish_and_clear();

    let mut rows = Vec::with_capacity(inputs.len());
    for (input, parsed) in inputs.iter().zip(parsed) {
        let row = match parsed {
            Err(reason) => PriceRow::Invalid {
                input: input.clone(),
                reason,
            },
            Ok(ticker) => match results.next() {
                Some(Ok(price)) => PriceRow::Quote { ticker, price },
                Some(Err(error)) => PriceRow::Failed { ticker, error },
                None => PriceRow::Failed {
                    error: PriceError::WorkerGone(ticker.to_string()),
                    ticker,
                },
            },
        };
        rows.push(row);
    }
    rows
}

pub fn display_rows(rows: &[PriceRow], display: &DisplayConfig) -> String {
    let currency = &display.currency;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ticker"),
        ui::header_cell(&format!("Price ({currency})")),
        ui::header_cell("Status"),
    ]);

    for row in rows {
        match row {
            PriceRow::Quote { ticker, price } => table.add_row(vec![
                Cell::new(ticker),
                ui::money_cell(price * display.conversion_rate, currency),
                Cell::new("OK").fg(Color::Green),
            ]),
            PriceRow::Failed { ticker, error } => table.add_row(vec![
                Cell::new(ticker),
                ui::na_cell(true),
                Cell::new(error).fg(Color::Red),
            ]),
            PriceRow::Invalid { input, reason } => table.add_row(vec![
                Cell::new(input),
                ui::na_cell(false),
                Cell::new(reason).fg(Color::DarkGrey),
            ]),
        };
    }
    table.to_string()
}

pub async fn run(prices: &PriceService, inputs: &[String], display: &DisplayConfig) -> Result<()> {
    if inputs.is_empty() {
        return Err(anyhow!("At least one ticker is required"));
    }
    let rows = resolve_rows(prices, inputs).await;
    println!("{}", display_rows(&rows, display));
    Ok(())
}
