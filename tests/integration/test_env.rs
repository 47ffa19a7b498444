// Copyright © 2024 Pathway

use std::env;

use assert_matches::assert_matches;

use metaprop_engine::engine::concurrency::{SCAN_CHUNK_SIZE_ENV, SCAN_THREADS_ENV};
use metaprop_engine::engine::ScanConfig;
use metaprop_engine::env::{parse_env_var, parse_env_var_or, Error};

#[test]
fn test_parse_env_var() -> eyre::Result<()> {
    let name = "METAPROP_TEST_PARSE_ENV_VAR";
    env::remove_var(name);
    assert_eq!(parse_env_var::<usize>(name)?, None);
    assert_eq!(parse_env_var_or(name, 7_usize)?, 7);

    env::set_var(name, " 12 ");
    assert_eq!(parse_env_var::<usize>(name)?, Some(12));

    env::set_var(name, "twelve");
    assert_matches!(parse_env_var::<usize>(name), Err(Error::ParsingFailed(var, _)) if var == name);
    env::remove_var(name);
    Ok(())
}

#[test]
fn test_scan_config_from_env() -> eyre::Result<()> {
    env::remove_var(SCAN_CHUNK_SIZE_ENV);
    env::remove_var(SCAN_THREADS_ENV);
    assert_eq!(ScanConfig::from_env()?, ScanConfig::default());

    env::set_var(SCAN_CHUNK_SIZE_ENV, "0");
    env::set_var(SCAN_THREADS_ENV, "2");
    assert_eq!(
        ScanConfig::from_env()?,
        ScanConfig {
            chunk_size: 1,
            threads: Some(2),
        }
    );

    env::set_var(SCAN_THREADS_ENV, "-1");
    assert_matches!(ScanConfig::from_env(), Err(Error::ParsingFailed(_, _)));

    env::remove_var(SCAN_CHUNK_SIZE_ENV);
    env::remove_var(SCAN_THREADS_ENV);
    Ok(())
}
