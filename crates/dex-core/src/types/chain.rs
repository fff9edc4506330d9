//! Chain identifiers and explorer links.

/// Sentinel address the aggregator uses for a chain's native token.
pub const NATIVE_TOKEN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// Explorer base for transaction links.
pub const EXPLORER_BASE_URL: &str = "https://web3.okx.com/explorer";

/// Whether `address` is the native-token sentinel (case-insensitive).
pub fn is_native_token(address: &str) -> bool {
    address.trim().eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS)
}

/// Explorer path segment for a gateway chain index.
pub fn explorer_slug(chain_index: &str) -> &str {
    match chain_index {
        "1" => "eth",
        "10" => "optimism",
        "56" => "bsc",
        "137" => "polygon",
        "324" => "zksync",
        "8453" => "base",
        "42161" => "arbitrum",
        "43114" => "avax",
        "59144" => "linea",
        other => other,
    }
}

/// Explorer link for a transaction hash on the given chain.
pub fn explorer_tx_url(chain_index: &str, tx_hash: &str) -> String {
    format!(
        "{}/{}/tx/{}",
        EXPLORER_BASE_URL,
        explorer_slug(chain_index),
        tx_hash
    )
}
