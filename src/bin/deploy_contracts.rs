use anyhow::Context;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use ethers::utils::{format_ether, to_checksum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";
const DEPLOYMENT_FILE: &str = "deployment.json";

#[derive(Debug, Serialize)]
struct DeploymentRecord {
    network: String,
    deployed_at: String,
    deployer: String,
    contracts: BTreeMap<String, String>,
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// 0.01 ETH
fn minimum_balance() -> U256 {
    U256::exp10(16)
}

// Mirrors PLACEHOLDER_*_ADDRESS in the server's constants; this binary does
// not link the server modules.
fn placeholder_address(digit: char) -> String {
    format!("0x{}", digit.to_string().repeat(40))
}

fn placeholder_contracts() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("txspk_token".to_string(), placeholder_address('1')),
        ("messaging".to_string(), placeholder_address('2')),
        ("presale".to_string(), placeholder_address('3')),
    ])
}

fn contracts_endpoint(backend_url: &str) -> String {
    format!("{}/api/contracts", backend_url.trim_end_matches('/'))
}

fn print_new_wallet() {
    let wallet = LocalWallet::new(&mut ethers::core::rand::thread_rng());
    let address = to_checksum(&wallet.address(), None);
    let private_key = hex::encode(wallet.signer().to_bytes());

    println!("No PRIVATE_KEY set. Generated a fresh deployer wallet:");
    println!("  Address:     {address}");
    println!("  Private key: 0x{private_key}");
    println!();
    println!("Next steps:");
    println!("  1. Fund {address} with Sepolia ETH from a faucet");
    println!("  2. Add PRIVATE_KEY=0x{private_key} to .env");
    println!("  3. Run deploy_contracts again");
}

async fn register_with_backend(contracts: &BTreeMap<String, String>) -> anyhow::Result<()> {
    let backend_url = env_value("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let endpoint = contracts_endpoint(&backend_url);

    let mut request = reqwest::Client::new().post(&endpoint).json(contracts);
    if let Some(admin_key) = env_value("ADMIN_API_KEY") {
        request = request.header("x-admin-key", admin_key);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("failed to reach backend at {endpoint}"))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("backend rejected contract update ({status}): {body}");
    }

    tracing::info!("Registered contract addresses with {}", endpoint);
    Ok(())
}

/// Writes the deployment record even when the backend could not be updated;
/// the addresses can then be registered by hand.
fn record_deployment(
    registration: anyhow::Result<()>,
    record: &DeploymentRecord,
    path: &Path,
) -> anyhow::Result<()> {
    if let Err(err) = registration {
        tracing::warn!("Could not register contracts with backend: {:#}", err);
        tracing::warn!("Update the backend manually via POST /api/contracts");
    }

    std::fs::write(path, serde_json::to_string_pretty(record)?)
        .with_context(|| format!("failed to write {}", path.display()))
}

async fn run() -> anyhow::Result<()> {
    let rpc_url = env_value("ETH_RPC_URL")
        .or_else(|| env_value("INFURA_URL"))
        .context("ETH_RPC_URL (or INFURA_URL) must be set")?;

    let Some(private_key) = env_value("PRIVATE_KEY") else {
        print_new_wallet();
        return Ok(());
    };
    let network = env_value("NETWORK").unwrap_or_else(|| "sepolia".to_string());

    let wallet: LocalWallet = private_key
        .trim_start_matches("0x")
        .parse()
        .context("PRIVATE_KEY is not a valid secp256k1 key")?;
    let deployer: Address = wallet.address();

    let provider = Provider::<Http>::try_from(rpc_url.as_str()).context("invalid RPC URL")?;
    let block = provider.get_block_number().await?;
    let balance = provider.get_balance(deployer, None).await?;

    tracing::info!("Connected to {} at block {}", network, block);
    tracing::info!(
        "Deployer {} has {} ETH",
        to_checksum(&deployer, None),
        format_ether(balance)
    );

    if balance < minimum_balance() {
        tracing::warn!(
            "Deployer balance below {} ETH; fund the wallet before deploying",
            format_ether(minimum_balance())
        );
        return Ok(());
    }

    let contracts = placeholder_contracts();
    for (name, address) in &contracts {
        tracing::info!("{}: {}", name, address);
    }

    let registration = register_with_backend(&contracts).await;

    let record = DeploymentRecord {
        network,
        deployed_at: chrono::Utc::now().to_rfc3339(),
        deployer: to_checksum(&deployer, None),
        contracts,
    };
    record_deployment(registration, &record, Path::new(DEPLOYMENT_FILE))?;
    println!("Deployment info saved to {DEPLOYMENT_FILE}");

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deploy_contracts=info".into()),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_distinct_valid_addresses() {
        let contracts = placeholder_contracts();
        assert_eq!(contracts.len(), 3);
        for address in contracts.values() {
            assert_eq!(address.len(), 42);
            assert!(address.parse::<Address>().is_ok());
        }
        assert_eq!(
            contracts["messaging"],
            "0x2222222222222222222222222222222222222222"
        );
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        assert_eq!(
            contracts_endpoint("http://localhost:8001/"),
            "http://localhost:8001/api/contracts"
        );
    }

    #[test]
    fn record_is_written_when_backend_is_unreachable() {
        let path = std::env::temp_dir().join(format!(
            "txspeak-deployment-{}.json",
            std::process::id()
        ));
        let record = DeploymentRecord {
            network: "sepolia".to_string(),
            deployed_at: "2026-01-01T00:00:00+00:00".to_string(),
            deployer: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            contracts: placeholder_contracts(),
        };

        record_deployment(
            Err(anyhow::anyhow!("connection refused")),
            &record,
            &path,
        )
        .expect("record written");

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        std::fs::remove_file(&path).ok();

        assert_eq!(saved["network"], "sepolia");
        assert_eq!(
            saved["contracts"]["presale"],
            "0x3333333333333333333333333333333333333333"
        );
    }

    #[test]
    fn minimum_balance_is_a_hundredth_of_an_ether() {
        assert_eq!(minimum_balance(), U256::from(10_000_000_000_000_000u64));
    }
}
