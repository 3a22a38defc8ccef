use clap::Args;

use crate::auth::CredentialHasher;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::services::ProvisioningService;
use crate::types::{CompanyResponse, CreateCompanyRequest};

#[derive(Args, Debug)]
pub struct CreateCompanyArgs {
    #[arg(long, help = "Company name")]
    pub name: String,

    #[arg(long, default_value = "", help = "Industry")]
    pub industry: String,

    #[arg(long, help = "Country")]
    pub country: String,

    #[arg(long, help = "IANA timezone, e.g. Africa/Lagos")]
    pub timezone: String,

    #[arg(long, help = "Admin employee name")]
    pub admin_name: String,

    #[arg(long, help = "Admin employee email")]
    pub admin_email: String,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, help = "Admin password")]
    pub admin_password: String,
}

impl From<CreateCompanyArgs> for CreateCompanyRequest {
    fn from(args: CreateCompanyArgs) -> Self {
        Self {
            name: args.name,
            industry: args.industry,
            country: args.country,
            timezone: args.timezone,
            admin_email: args.admin_email,
            admin_name: args.admin_name,
            admin_password: args.admin_password,
        }
    }
}

pub async fn handle(
    args: CreateCompanyArgs,
    config: AppConfig,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let (manager, store) = super::connect_store(&config).await?;
    let hasher = CredentialHasher::from_config(&config.security)?;
    let service = ProvisioningService::new(store, hasher);

    let deadline = tokio::time::Instant::now() + config.server.request_timeout();
    let result = service.create_company(args.into(), Some(deadline)).await;
    manager.close().await;

    let company = CompanyResponse::from(result?);
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&company)?),
        OutputFormat::Text => println!("Created company {} (id {})", company.name, company.id),
    }
    Ok(())
}
