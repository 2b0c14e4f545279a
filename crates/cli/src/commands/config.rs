use std::env;
use std::fs;
use std::path::PathBuf;

use toml::Value;

use crate::config::CliConfig;

/// Renders the effective configuration with the winning source per field.
pub fn run(config: &CliConfig) -> String {
    let config_file = existing_config_file().and_then(|path| {
        let doc = fs::read_to_string(&path).ok()?.parse::<Value>().ok()?;
        Some((path, doc))
    });

    let fields = [
        ("catalog.path", "TALLY_CATALOG_PATH", config.catalog.path.display().to_string()),
        ("pricing.currency", "TALLY_PRICING_CURRENCY", config.pricing.currency.clone()),
        ("pricing.store", "TALLY_PRICING_STORE", config.pricing.store.clone()),
        (
            "pricing.gross_prices",
            "TALLY_PRICING_GROSS_PRICES",
            config.pricing.gross_prices.to_string(),
        ),
        (
            "pricing.tax_inclusive",
            "TALLY_PRICING_TAX_INCLUSIVE",
            config.pricing.tax_inclusive.to_string(),
        ),
        (
            "pricing.price_range_format",
            "TALLY_PRICING_PRICE_RANGE_FORMAT",
            config.pricing.price_range_format.clone(),
        ),
        ("logging.level", "TALLY_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "TALLY_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key, value) in fields {
        let source = if env::var_os(env_key).is_some() {
            format!("env ({env_key})")
        } else {
            match &config_file {
                Some((path, doc)) if file_sets_key(doc, key) => {
                    format!("file ({})", path.display())
                }
                _ => "default".to_string(),
            }
        };
        lines.push(format!("- {key} = {value} (source: {source})"));
    }
    lines.join("\n")
}

fn existing_config_file() -> Option<PathBuf> {
    ["tally.toml", "config/tally.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn file_sets_key(doc: &Value, dotted_key: &str) -> bool {
    let mut current = doc;
    for part in dotted_key.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}
