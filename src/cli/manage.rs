use crate::core::holding::{Holding, HoldingDraft, HoldingStore};
use anyhow::{Result, anyhow};
use tracing::info;

/// Fields to change on an existing holding; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct HoldingChanges {
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub quantity: Option<u32>,
    pub buy_price: Option<f64>,
}

impl HoldingChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ticker.is_none()
            && self.quantity.is_none()
            && self.buy_price.is_none()
    }

    /// Applies the changes on top of `holding`, re-validating the result.
    pub fn apply(self, holding: &Holding) -> Result<HoldingDraft> {
        let quantity = match self.quantity {
            Some(quantity) => quantity,
            None => u32::try_from(holding.quantity).map_err(|_| {
                anyhow!(
                    "Holding {} has quantity {}, pass a new quantity",
                    holding.id,
                    holding.quantity
                )
            })?,
        };
        HoldingDraft::new(
            self.name.as_deref().unwrap_or(&holding.name),
            self.ticker.as_deref().unwrap_or(&holding.ticker),
            quantity,
            self.buy_price.unwrap_or(holding.buy_price),
        )
    }
}

pub async fn add(
    store: &dyn HoldingStore,
    name: &str,
    ticker: &str,
    quantity: u32,
    buy_price: f64,
) -> Result<()> {
    let draft = HoldingDraft::new(name, ticker, quantity, buy_price)?;
    let created = store.create(&draft).await?;
    info!(id = created.id, ticker = %created.ticker, "Added holding");
    println!(
        "Added {} ({}) with id {}",
        created.name, created.ticker, created.id
    );
    Ok(())
}

pub async fn edit(store: &dyn HoldingStore, id: u64, changes: HoldingChanges) -> Result<()> {
    if changes.is_empty() {
        return Err(anyhow!("Nothing to change for holding {id}"));
    }
    let current = store.get(id).await?;
    let draft = changes.apply(&current)?;
    let updated = store.update(id, &draft).await?;
    info!(id, ticker = %updated.ticker, "Updated holding");
    println!("Updated {} ({})", updated.name, updated.ticker);
    Ok(())
}

pub async fn delete(store: &dyn HoldingStore, id: u64) -> Result<()> {
    store.delete(id).await?;
    info!(id, "Deleted holding");
    println!("Deleted holding {id}");
    Ok(())
}
