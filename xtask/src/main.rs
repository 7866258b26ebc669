//! Build automation for springboot-operator
//!
//! Usage: cargo xtask <command>
//!
//! Available commands:
//! - build: Build the project
//! - test: Run tests
//! - dist: Create distribution packages
//! - crd: Regenerate the CustomResourceDefinition manifest
//! - ci: Run CI checks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BINARY: &str = "springboot-operator";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for springboot-operator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project
    Build {
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Create distribution packages
    Dist {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(long)]
        target: Option<String>,
    },
    /// Write the CRD manifest generated from the Rust types
    Crd {
        /// Output file (default: deploy/crd.yaml)
        #[arg(long, default_value = "deploy/crd.yaml")]
        output: String,
    },
    /// Run CI checks (format, clippy, test)
    Ci,
    /// Format code
    Format {
        /// Check formatting without modifying files
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    sh.change_dir(project_root()?);

    match cli.command {
        Commands::Build { release } => build(&sh, release),
        Commands::Test { integration } => test(&sh, integration),
        Commands::Dist { target } => dist(&sh, target),
        Commands::Crd { output } => crd(&sh, &output),
        Commands::Ci => ci(&sh),
        Commands::Format { check } => format(&sh, check),
        Commands::Clippy => clippy(&sh),
    }
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building {}...", BINARY);

    if release {
        cmd!(sh, "cargo build --release").run()?;
        println!("✅ Release build completed: target/release/{}", BINARY);
    } else {
        cmd!(sh, "cargo build").run()?;
        println!("✅ Debug build completed: target/debug/{}", BINARY);
    }

    Ok(())
}

fn test(sh: &Shell, integration: bool) -> Result<()> {
    println!("🧪 Running tests...");

    if integration {
        cmd!(sh, "cargo test --test '*'").run()?;
    } else {
        cmd!(sh, "cargo test --all").run()?;
    }

    println!("✅ All tests passed");
    Ok(())
}

fn dist(sh: &Shell, target: Option<String>) -> Result<()> {
    println!("📦 Creating distribution package...");

    if let Some(ref target_triple) = target {
        cmd!(sh, "cargo build --release --target {target_triple}").run()?;
    } else {
        cmd!(sh, "cargo build --release").run()?;
    }

    let root = project_root()?;
    let dist_dir = root.join("dist");
    sh.create_dir(&dist_dir)?;

    let binary_src = match target {
        Some(ref target_triple) => root.join(format!("target/{}/release/{}", target_triple, BINARY)),
        None => root.join(format!("target/release/{}", BINARY)),
    };
    sh.copy_file(&binary_src, dist_dir.join(BINARY))?;

    // Ship the CRD next to the binary so a release is installable on its own
    crd(sh, "dist/crd.yaml")?;

    let version = env!("CARGO_PKG_VERSION");
    let archive_name = format!("{}-{}.tar.gz", BINARY, version);

    cmd!(sh, "tar -czf {archive_name} -C dist {BINARY} crd.yaml")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Distribution package created: {}", archive_name);
    Ok(())
}

fn crd(sh: &Shell, output: &str) -> Result<()> {
    println!("📄 Generating CRD manifest...");

    let yaml = cmd!(sh, "cargo run --quiet --bin {BINARY} -- crd")
        .read()
        .context("Failed to render CRD")?;

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            sh.create_dir(parent)?;
        }
    }
    sh.write_file(output, format!("{}\n", yaml))?;

    println!("✅ CRD written to {}", output);
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("🔍 Running CI checks...");

    println!("\n📝 Checking formatting...");
    format(sh, true)?;

    println!("\n🔧 Running clippy...");
    clippy(sh)?;

    println!("\n🧪 Running tests...");
    test(sh, false)?;

    println!("\n✅ All CI checks passed!");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    if check {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
        println!("✅ Code formatting is correct");
    } else {
        cmd!(sh, "cargo fmt --all").run()?;
        println!("✅ Code formatted");
    }
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(
        sh,
        "cargo clippy --all-targets --all-features -- -D warnings"
    )
    .run()?;
    println!("✅ Clippy checks passed");
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .map(Path::to_path_buf)
        .context("xtask must live one level below the workspace root")
}
