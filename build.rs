//! Build script for iptrules
//!
//! Embeds build-time information (git commit, dirty status, build timestamp)
//! for the `version` subcommand.

fn main() {
    shadow_rs::ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build info");
}
