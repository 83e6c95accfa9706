//! # Static Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de archivos estáticos.
//!
//! La configuración viene de la línea de comandos o de variables de
//! entorno (ver `--help`). El nivel de log se controla con `RUST_LOG`.

use clap::Parser;
use static_server::config::Config;
use static_server::server::{install_shutdown_flag, Server};
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================");
    println!("  Static HTTP/1.0 Server");
    println!("  Principios de Sistemas Operativos");
    println!("=================================\n");

    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        process::exit(2);
    }
    config.print_summary();

    let shutdown = match install_shutdown_flag() {
        Ok(flag) => flag,
        Err(e) => {
            eprintln!("💥 No se pudieron registrar las señales: {}", e);
            process::exit(1);
        }
    };

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("💥 Error fatal: {}", e);
            process::exit(1);
        }
    };

    match server.run(shutdown) {
        Ok(snapshot) => {
            println!(
                "👋 Servidor detenido ({} requests, {} descartadas)",
                snapshot.total_requests, snapshot.dropped_connections
            );
        }
        Err(e) => {
            eprintln!("💥 Error fatal: {}", e);
            process::exit(1);
        }
    }
}
