use clap::{Parser, Subcommand};
use invoicebox_commerce::application::callback::CallbackVerifier;
use invoicebox_commerce::application::payment_link::CheckoutService;
use invoicebox_commerce::config::Settings;
use invoicebox_commerce::domain::notification::{CallbackRequest, RequestParams};
use invoicebox_commerce::domain::order::{Order, PaymentRecord};
use invoicebox_commerce::infrastructure::http_gateway::InvoiceboxHttpClient;
use invoicebox_commerce::infrastructure::in_memory::{InMemoryCurrencies, InMemoryOrderProcessor};
use invoicebox_commerce::infrastructure::signature::sign;
use miette::{IntoDiagnostic, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). `INVOICEBOX_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the gateway order request for an order without sending it
    Preview {
        /// Order JSON file, cart items included
        order: PathBuf,
    },
    /// Create a payment for an order and request its payment link
    Link {
        /// Order JSON file, cart items included
        order: PathBuf,
    },
    /// Handle a payment notification and print the JSON response
    Callback {
        /// Raw notification body
        body: PathBuf,
        /// Payment records known to the processor (JSON array)
        #[arg(long)]
        payments: PathBuf,
        /// Value of the X-Signature header
        #[arg(long)]
        signature: Option<String>,
        /// Query string of the notification URL
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Print the signature the gateway would send for a notification body
    Sign {
        /// Raw notification body
        body: PathBuf,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&content).into_diagnostic()
}

fn checkout(settings: Settings, order: Order) -> Result<CheckoutService> {
    let gateway = InvoiceboxHttpClient::from_settings(&settings).into_diagnostic()?;
    Ok(CheckoutService::new(
        settings,
        Box::new(InMemoryOrderProcessor::with_order(order)),
        Box::new(InMemoryCurrencies::default()),
        Box::new(gateway),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Command::Preview { order } => {
            let service = checkout(settings, read_json(&order)?)?;
            let request = service.prepare().await.into_diagnostic()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&request).into_diagnostic()?
            );
        }
        Command::Link { order } => {
            let service = checkout(settings, read_json(&order)?)?;
            match service.payment_link().await.into_diagnostic()? {
                Some(url) => println!("{}", url),
                None => bail!("The gateway did not return a payment link, try again later"),
            }
        }
        Command::Callback {
            body,
            payments,
            signature,
            query,
        } => {
            let processor = InMemoryOrderProcessor::new();
            processor
                .load_payments(read_json::<Vec<PaymentRecord>>(&payments)?)
                .await;
            let verifier =
                CallbackVerifier::from_settings(&settings, Box::new(processor)).into_diagnostic()?;

            let request = CallbackRequest {
                body: fs::read(body).into_diagnostic()?,
                signature,
                params: RequestParams::from_query(&query),
            };
            let response = verifier.handle(&request).await;
            println!("{}", response.to_json());
        }
        Command::Sign { body } => {
            if settings.api_key.is_empty() {
                bail!("api_key is not configured");
            }
            let body = fs::read(body).into_diagnostic()?;
            println!(
                "{}",
                sign(settings.signature_algorithm, &settings.api_key, &body)
            );
        }
    }

    Ok(())
}
