//! Build script embedding the source revision into the player binary

use std::process::Command;

fn main() {
    let output = Command::new("git").args(["describe", "--always", "--dirty"]).output();

    let revision = match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => String::from("unknown"),
    };

    println!("cargo:rustc-env=TOUR_ENGINE_REVISION={}", revision);
    println!("cargo:rerun-if-changed=.git/HEAD");
}
