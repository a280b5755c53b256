use super::ui;
use crate::core::analytics::{self, PortfolioValue};
use crate::core::config::DisplayConfig;
use crate::core::holding::HoldingStore;
use crate::quotes::PriceService;
use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment};

impl PortfolioValue {
    pub fn display_as_table(&self) -> String {
        if self.holdings.is_empty() {
            return ui::style_text(
                "No holdings yet. Add one with `stockify add`",
                ui::StyleType::Subtle,
            );
        }

        let currency = &self.currency;
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("ID"),
            ui::header_cell("Name"),
            ui::header_cell("Ticker"),
            ui::header_cell("Qty"),
            ui::header_cell("Buy Price"),
            ui::header_cell("Current Price"),
            ui::header_cell("Value"),
            ui::header_cell("Change"),
        ]);

        for h in &self.holdings {
            let change = match h.change_pct() {
                Some(pct) => ui::change_cell(pct),
                None => ui::na_cell(false),
            };
            table.add_row(vec![
                Cell::new(h.holding.id),
                Cell::new(&h.holding.name),
                Cell::new(&h.holding.ticker),
                Cell::new(h.holding.quantity).set_alignment(CellAlignment::Right),
                ui::money_cell(h.buy_price, currency),
                ui::price_cell(h.price, currency, h.live),
                ui::money_cell(h.value, currency),
                change,
            ]);
        }

        table.add_row(vec![
            Cell::new(ui::style_text("Total", ui::StyleType::TotalLabel)),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(ui::style_text(
                &ui::money(self.total_value, currency),
                ui::StyleType::TotalValue,
            ))
            .set_alignment(CellAlignment::Right),
            Cell::new(""),
        ]);

        table.to_string()
    }
}

pub async fn run(
    store: &dyn HoldingStore,
    prices: &PriceService,
    display: &DisplayConfig,
) -> Result<()> {
    let holdings = store
        .list()
        .await
        .context("Failed to load holdings")?;

    let pb = ui::new_progress_bar(holdings.len() as u64, true);
    pb.set_message("Fetching prices...");

    let portfolio = analytics::calculate_portfolio_value(
        &holdings,
        prices,
        display.conversion_rate,
        &display.currency,
        &|| pb.inc(1),
    )
    .await;
    pb.finish_and_clear();

    println!("{}", portfolio.display_as_table());
    if portfolio.holdings.iter().any(|h| !h.live) {
        println!(
            "{}",
            ui::style_text(
                "Some prices could not be fetched and show the last known value",
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analytics::HoldingValue;
    use crate::core::holding::Holding;

    #[test]
    fn test_table_contains_rows_and_total() {
        console::set_colors_enabled(false);
        let holding = Holding {
            id: 3,
            name: "Apple".to_string(),
            ticker: "AAPL".to_string(),
            quantity: 4,
            buy_price: 100.0,
            current_price: None,
        };
        let portfolio = PortfolioValue {
            holdings: vec![HoldingValue {
                holding,
                price: 90.0,
                buy_price: 100.0,
                value: 360.0,
                live: false,
            }],
            total_value: 360.0,
            currency: "USD".to_string(),
        };

        let table = portfolio.display_as_table();
        assert!(table.contains("AAPL"));
        assert!(table.contains("90.00 USD"));
        assert!(table.contains("-10.00%"));
        assert!(table.contains("Total"));
        assert!(table.contains("360.00 USD"));
    }

    #[test]
    fn test_empty_table_message() {
        console::set_colors_enabled(false);
        let portfolio = PortfolioValue {
            holdings: Vec::new(),
            total_value: 0.0,
            currency: "USD".to_string(),
        };
        assert!(portfolio.display_as_table().contains("No holdings yet"));
    }
}
