//! Procedural macro that builds playback services from their YAML configuration block
extern crate proc_macro;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod config;

/// Implement `trip_playback::config::FromServiceConfig` for a struct with named fields.
///
/// Every field becomes a configuration key of the same name. Fields marked with
/// `#[service_config(skip)]` keep their `Default` value.
#[proc_macro_derive(FromServiceConfig, attributes(service_config))]
pub fn derive_from_service_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    config::expand_derive_from_service_config(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
