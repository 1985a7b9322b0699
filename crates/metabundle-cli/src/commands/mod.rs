//! CLI subcommand implementations

pub mod bundle;
pub mod index;

use metabundle_engine::PrivateMetadata;

/// Print the hoisted private symbols to stderr
pub fn print_privates(privates: &[PrivateMetadata]) {
    if privates.is_empty() {
        eprintln!("No private symbols hoisted.");
        return;
    }
    eprintln!("Private symbols ({}):", privates.len());
    for entry in privates {
        eprintln!("  {} = {} ({})", entry.private_name, entry.name, entry.module);
    }
}
