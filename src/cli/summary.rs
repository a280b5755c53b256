use super::ui;
use crate::core::analytics::{self, PortfolioValue};
use crate::core::config::DisplayConfig;
use crate::core::holding::HoldingStore;
use crate::quotes::PriceService;
use anyhow::{Context, Result};
use comfy_table::Cell;

impl PortfolioValue {
    /// Dashboard view: total value, top performer and distribution.
    pub fn display_as_dashboard(&self) -> String {
        let currency = &self.currency;
        let mut output = format!(
            "{}\n\n",
            ui::style_text("Portfolio Dashboard", ui::StyleType::Title)
        );

        output.push_str(&format!(
            "Total Portfolio Value: {}\n",
            ui::style_text(&ui::money(self.total_value, currency), ui::StyleType::TotalValue)
        ));
        output.push_str(&format!(
            "Holdings: {}\n",
            ui::style_text(&self.holdings.len().to_string(), ui::StyleType::TotalLabel)
        ));

        match self.top_performer() {
            Some(top) => {
                let pct = top.change_pct().unwrap_or_default();
                output.push_str(&format!(
                    "Top Performer: {} ({}) {:+.2}%\n",
                    ui::style_text(&top.holding.name, ui::StyleType::TotalLabel),
                    top.holding.ticker,
                    pct
                ));
            }
            None => output.push_str("Top Performer: N/A\n"),
        }

        let distribution = self.distribution();
        if distribution.is_empty() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text("No distribution to show", ui::StyleType::Subtle)
            ));
            return output;
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Holding"),
            ui::header_cell(&format!("Value ({currency})")),
            ui::header_cell("Weight (%)"),
        ]);
        for allocation in &distribution {
            table.add_row(vec![
                Cell::new(&allocation.name),
                ui::money_cell(allocation.value, currency),
                Cell::new(format!("{:.2}%", allocation.weight))
                    .set_alignment(comfy_table::CellAlignment::Right),
            ]);
        }

        output.push_str(&format!("\nDistribution\n{table}"));
        output
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
        .context("Failed to load dashboard data. Please try again later")?;

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

    println!("{}", portfolio.display_as_dashboard());
    Ok(())
}
