use std::path::PathBuf;

use colored::Colorize;

use crate::adapters::http::hsm_service::HttpHsmService;
use crate::cli::HsmAction;
use crate::cli::commands::api_helpers;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{HsmError, Result};
use crate::core::models::hsm::{OperationStatus, is_valid_ipv4};
use crate::core::traits::hsm_provisioning::HsmProvisioning;

/// Execute the `hsmctl hsm` command.
pub fn execute(config: &AppConfig, action: &HsmAction) -> Result<()> {
    let client = api_helpers::client(config)?;
    let service = HttpHsmService::new(&client);
    match action {
        HsmAction::Health => execute_health(&service),
        HsmAction::Configure { ip, cert } => execute_configure(&service, ip, cert),
        HsmAction::Test => execute_test(&service),
    }
}

fn execute_health(service: &impl HsmProvisioning) -> Result<()> {
    let sp = output::spinner("Checking HSM health...");
    let health = service.health();
    output::clear_spinner(sp);
    let health = health?;

    output::header("HSM status");
    print_flag("Configured", health.configured);
    print_flag("Connected", health.connected);
    print_flag("Certificate", health.certificate_exists);
    if let Some(err) = &health.error {
        output::warning(err);
    }

    if health.is_ready() {
        output::success("Ready for key management");
    } else {
        println!("\n  Configure with: hsmctl hsm configure --ip <address> --cert customerCA.crt");
    }
    Ok(())
}

fn print_flag(name: &str, value: bool) {
    let shown = if value { "yes".green() } else { "no".red() };
    println!("  {name:<12} {shown}");
}

fn execute_configure(service: &impl HsmProvisioning, ip: &str, cert: &str) -> Result<()> {
    if !is_valid_ipv4(ip) {
        return Err(HsmError::ValidationError {
            detail: format!("Invalid IP address format: '{ip}'"),
        });
    }
    let cert_path = PathBuf::from(cert);
    if !cert_path.exists() {
        return Err(HsmError::ValidationError {
            detail: format!("Certificate file not found: {}", cert_path.display()),
        });
    }
    let certificate = std::fs::read(&cert_path)?;
    if certificate.is_empty() {
        return Err(HsmError::ValidationError {
            detail: "Certificate file is empty".into(),
        });
    }

    let sp = output::spinner(&format!("Configuring HSM at {ip}..."));
    let status = service.configure(ip, certificate);
    output::clear_spinner(sp);
    report(status?)?;
    println!("\n  Next: hsmctl login --username <crypto-user>");
    Ok(())
}

fn execute_test(service: &impl HsmProvisioning) -> Result<()> {
    let sp = output::spinner("Testing HSM connection...");
    let status = service.test_connection();
    output::clear_spinner(sp);
    report(status?)
}

/// Print a successful status, or turn a failed one into an error.
fn report(status: OperationStatus) -> Result<()> {
    if status.success {
        output::success(&status.message);
        Ok(())
    } else {
        Err(HsmError::ValidationError {
            detail: status.message,
        })
    }
}
