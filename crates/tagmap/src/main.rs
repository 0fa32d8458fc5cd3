//! `tagmap` - CLI and web server for work-site maps.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tagmap::cli::{BuildCommand, Cli, Command, ConfigCommand, ServeCommand};
use tagmap::{init_logging, Config, MapBuilder};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match cli.command {
        Command::Serve(cmd) => handle_serve(load_config(cli.config)?, &cmd),
        Command::Build(cmd) => handle_build(load_config(cli.config)?, &cmd),
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    Config::load_from(path).context("loading configuration")
}

fn handle_serve(mut config: Config, cmd: &ServeCommand) -> Result<()> {
    if let Some(host) = &cmd.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }

    let builder = MapBuilder::new(config)?;
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(tagmap::server::serve(builder))?;
    Ok(())
}

fn handle_build(mut config: Config, cmd: &BuildCommand) -> Result<()> {
    if let Some(dir) = &cmd.output_dir {
        config.paths.output_dir.clone_from(dir);
    }
    if let Some(schema) = cmd.schema {
        config.map.schema = schema.into();
    }

    let builder = MapBuilder::new(config)?;
    let handle = builder
        .build(&cmd.file)
        .with_context(|| format!("building map from {}", cmd.file.display()))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&handle)?);
    } else {
        println!("Map written to {}", handle.path.display());
        println!("  Markers:  {}", handle.markers);
        for (color, count) in &handle.colors {
            println!("    {color:<8}{count}");
        }
        println!("  Size:     {} bytes", handle.bytes);
        println!("  BLAKE3:   {}", handle.digest);
    }
    Ok(())
}

fn handle_config(path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Address:            {}", config.bind_address());
                println!("  Max upload bytes:   {}", config.server.max_upload_bytes);
                println!();
                println!("[Paths]");
                println!("  Upload dir:         {}", config.upload_dir().display());
                println!("  Document:           {}", config.document_path().display());
                println!();
                println!("[Map]");
                println!("  Schema:             {}", config.map.schema);
                println!("  Default zoom:       {}", config.map.default_zoom);
                println!("  Coordinate scale:   {}", config.map.coordinate_scale);
                println!("  Default color:      {}", config.map.default_color);
                for rule in &config.map.rules {
                    println!("  Rule:               \"{}\" -> {}", rule.pattern, rule.color);
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let target = file.or(path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", target.display());
            match Config::load_from(Some(target)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
