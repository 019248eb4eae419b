//! Deployment package: the files a user downloads after assembly.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::assembler::Assembly;
use crate::error::IacResult;
use crate::rules::GENERATOR_NAME;

/// One file in a package, with a forward-slash relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub path: String,
    pub contents: String,
}

/// Files for one assembled deployment.
#[derive(Debug, Clone, Default)]
pub struct DeploymentPackage {
    files: Vec<PackageFile>,
}

impl DeploymentPackage {
    /// `main.bicep`, `main.parameters.json` when parameters are included,
    /// one `modules/<id>.bicep` per module, `README.md` and `deploy.ps1`.
    pub fn from_assembly(assembly: &Assembly) -> IacResult<Self> {
        let mut package = Self::default();
        package.add("main.bicep", assembly.document.render());

        if let Some(parameters) = assembly.parameters_file() {
            let mut text = serde_json::to_string_pretty(&parameters)?;
            text.push('\n');
            package.add("main.parameters.json", text);
        }

        for module in &assembly.modules {
            package.add(module.path.clone(), module.document.render());
        }

        let names: Vec<&str> = assembly.resources.iter().map(|r| r.resource.name.as_str()).collect();
        package.add("README.md", readme(&names));
        package.add("deploy.ps1", deploy_script());
        Ok(package)
    }

    fn add(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.push(PackageFile {
            path: path.into(),
            contents: contents.into(),
        });
    }

    pub fn files(&self) -> &[PackageFile] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&PackageFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    /// Write every file under `dir`, creating directories as needed.
    /// Returns the written paths.
    pub async fn write_to(&self, dir: &Path) -> IacResult<Vec<PathBuf>> {
        info!("Writing deployment package to {:?}", dir);
        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = file.path.split('/').fold(dir.to_path_buf(), |acc, part| acc.join(part));
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &file.contents).await?;
            debug!("Wrote {:?}", path);
            written.push(path);
        }
        Ok(written)
    }
}

fn readme(resource_names: &[&str]) -> String {
    let resources: Vec<String> = resource_names.iter().map(|name| format!("- {}", name)).collect();
    format!(
        r#"# Azure Deployment Package

This package contains Bicep templates for deploying Azure resources.

## Resources Included

{resources}

## Deployment Instructions

### Prerequisites
- Azure CLI installed
- Azure subscription access
- Resource group created

### Deploy using Azure CLI

```bash
# Login to Azure
az login

# Set subscription
az account set --subscription <your-subscription-id>

# Create resource group (if not exists)
az group create --name <resource-group-name> --location <location>

# Deploy the template
az deployment group create \
  --resource-group <resource-group-name> \
  --template-file main.bicep \
  --parameters @main.parameters.json
```

### Deploy using PowerShell

```powershell
# Run the provided deployment script
.\deploy.ps1 -ResourceGroupName "<resource-group-name>" -Location "<location>"
```

## Customization

Edit the `main.parameters.json` file to customize the deployment parameters for your environment.

Generated by {generator}
"#,
        resources = resources.join("\n"),
        generator = GENERATOR_NAME,
    )
}

fn deploy_script() -> String {
    format!(
        r#"# Azure Deployment Script
# Generated by {generator}

param(
    [Parameter(Mandatory=$true)]
    [string]$ResourceGroupName,

    [Parameter(Mandatory=$true)]
    [string]$Location,

    [Parameter(Mandatory=$false)]
    [string]$SubscriptionId,

    [Parameter(Mandatory=$false)]
    [string]$ParametersFile = "main.parameters.json"
)

Write-Host "Starting Azure deployment..." -ForegroundColor Green

# Login check
try {{
    $context = Get-AzContext
    if (!$context) {{
        Write-Host "Please login to Azure first..." -ForegroundColor Yellow
        Connect-AzAccount
    }}
}} catch {{
    Write-Host "Please install Azure PowerShell module: Install-Module -Name Az" -ForegroundColor Red
    exit 1
}}

# Set subscription if provided
if ($SubscriptionId) {{
    Set-AzContext -SubscriptionId $SubscriptionId
}}

# Create resource group if it doesn't exist
$rg = Get-AzResourceGroup -Name $ResourceGroupName -ErrorAction SilentlyContinue
if (!$rg) {{
    Write-Host "Creating resource group: $ResourceGroupName" -ForegroundColor Yellow
    New-AzResourceGroup -Name $ResourceGroupName -Location $Location
}}

# Deploy Bicep template
Write-Host "Deploying Bicep template..." -ForegroundColor Yellow
try {{
    $deploymentArgs = @{{
        ResourceGroupName = $ResourceGroupName
        TemplateFile = "main.bicep"
        Verbose = $true
    }}
    if (Test-Path $ParametersFile) {{
        $deploymentArgs.TemplateParameterFile = $ParametersFile
    }}
    $deployment = New-AzResourceGroupDeployment @deploymentArgs

    Write-Host "Deployment completed successfully!" -ForegroundColor Green
    Write-Host "Deployment Name: $($deployment.DeploymentName)" -ForegroundColor Cyan

    if ($deployment.Outputs.Count -gt 0) {{
        Write-Host "`nDeployment Outputs:" -ForegroundColor Cyan
        $deployment.Outputs.GetEnumerator() | ForEach-Object {{
            Write-Host "  $($_.Key): $($_.Value.Value)" -ForegroundColor White
        }}
    }}
}} catch {{
    Write-Host "Deployment failed: $($_.Exception.Message)" -ForegroundColor Red
    exit 1
}}
"#,
        generator = GENERATOR_NAME,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readme_lists_resources() {
        let text = readme(&["Storage Account", "Web App"]);
        assert!(text.contains("- Storage Account\n- Web App"));
        assert!(text.contains("az deployment group create"));
    }

    #[test]
    fn test_deploy_script_braces() {
        let script = deploy_script();
        assert!(script.contains("try {\n    $context = Get-AzContext"));
        assert!(script.contains("[string]$ParametersFile = \"main.parameters.json\""));
        assert!(!script.contains("{{"));
    }
}
