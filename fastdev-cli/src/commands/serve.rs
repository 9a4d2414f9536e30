//! Serve command - run the development server in the foreground.

use std::path::PathBuf;

use clap::ValueEnum;
use fastdev::config::{CompileBackend, ConfigFile};
use fastdev::server::DevServer;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Backend selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Compile with local esbuild/sass and cache the outputs
    Local,
    /// Forward script compiles to an external build server
    BuildServer,
}

impl From<BackendArg> for CompileBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => CompileBackend::Local,
            BackendArg::BuildServer => CompileBackend::BuildServer,
        }
    }
}

/// Arguments for the serve command.
#[derive(Debug, Default)]
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
    pub backend: Option<BackendArg>,
    pub no_minify: bool,
    pub config: Option<PathBuf>,
    pub debug: bool,
}

/// Run the serve command.
pub fn run(args: ServeArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("serve");
    apply_overrides(runner.config_mut(), &args);
    let config = runner.config();

    println!(
        "Serving {} on http://{}:{}/ ({} backend)",
        config
            .server
            .root
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".to_string()),
        config.server.host,
        config.server.port,
        config.compiler.backend,
    );

    // Requests are handled cooperatively on one thread; compiles and the
    // build server round trip are the only suspension points.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async {
        let server = DevServer::new(config)?;
        server.run().await
    })?;

    Ok(())
}

/// Layer command-line flags over the loaded configuration.
fn apply_overrides(config: &mut ConfigFile, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(root) = &args.root {
        config.server.root = Some(root.clone());
    }
    if let Some(backend) = args.backend {
        config.compiler.backend = backend.into();
    }
    if args.no_minify {
        config.compiler.minify = false;
        config.build_server.minify = false;
    }
}
