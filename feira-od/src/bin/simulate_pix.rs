//! Attach a placeholder Pix receipt to the most recent order for a phone
//! number. Demo/support tool; touches nothing but that one order.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

// Generic receipt image, good enough for walkthroughs
const PLACEHOLDER_RECEIPT_URL: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/0/04/Boleto_Bancario.png/640px-Boleto_Bancario.png";
const PLACEHOLDER_ADDRESS: &str = "Rua Simulada, 123 - Bairro Teste";

#[derive(Parser, Debug)]
#[command(name = "simulate-pix", about = "Attach a placeholder Pix receipt to an order")]
struct Args {
    /// Customer phone number, with or without the country prefix
    #[arg(long)]
    phone: String,

    /// Path to the SQLite database
    #[arg(long, default_value = "feira.db")]
    database: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    let pool = feira_common::db::init_database(&args.database).await?;

    println!("Looking up latest order for phone: {}", args.phone);
    let Some(order) = feira_od::db::latest_order_by_phone(&pool, &args.phone).await? else {
        bail!("No order found for phone {}", args.phone);
    };

    println!(
        "Found order: ID {} - customer: {}",
        order.id,
        order.nome_cliente.as_deref().unwrap_or("?")
    );

    feira_od::db::set_receipt(&pool, order.id, Some(PLACEHOLDER_RECEIPT_URL)).await?;

    // A missing address makes the panel's delivery view useless; fill it in
    if order.endereco.as_deref().map_or(true, str::is_empty) {
        feira_od::db::update_address(&pool, order.id, PLACEHOLDER_ADDRESS).await?;
        println!("Added placeholder address");
    }

    println!("Receipt attached: {}", PLACEHOLDER_RECEIPT_URL);

    Ok(())
}
