use regex::Regex;
use std::fs;
use std::path::Path;

/// Fail CI if config files contain 64-hex private keys.
#[test]
fn no_committed_hex_keys_in_configs() {
    let re = Regex::new(r"\b(0x)?[a-fA-F0-9]{64}\b").unwrap();
    let candidates = ["config.toml", "config.example.toml", ".env", ".env.example"];
    for file in candidates {
        if !Path::new(file).exists() {
            continue;
        }
        let body = fs::read_to_string(file).expect("read config");
        for (idx, line) in body.lines().enumerate() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            if re.is_match(line) {
                panic!("Secret-looking hex in {} at line {}", file, idx + 1);
            }
        }
    }
}

#[test]
fn example_config_ships_without_key() {
    let body = fs::read_to_string("config.example.toml").expect("example config");
    assert!(body.contains("wallet_key = \"\""));
    assert!(body.contains("mint_count"));
}
