//! Deployment request models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A resource provisioning request submitted by the portal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    /// Owner submitting the request
    pub user_id: String,

    /// Provision an S3 bucket
    #[serde(default)]
    pub create_s3: bool,

    /// Provision an RDS database
    #[serde(default)]
    pub create_rds: bool,

    /// Provision an EKS cluster
    #[serde(default)]
    pub create_eks: bool,

    /// Bucket name when an S3 bucket was requested
    #[serde(default)]
    pub s3_bucket_name: Option<String>,

    /// Cluster name when an EKS cluster was requested
    #[serde(default)]
    pub cluster_name: Option<String>,

    /// Requested databases
    #[serde(default)]
    pub databases: Vec<DatabaseSpec>,
}

/// A single database definition within a deployment request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSpec {
    pub db_name: String,
    pub username: String,
    pub password: String,
}

impl DeploymentRequest {
    /// Flatten the request into scalar workflow inputs.
    ///
    /// The workflow dispatch interface accepts only named string inputs, so
    /// booleans are stringified and nested database fields are lifted to
    /// top-level keys. Only the first database is forwarded; the dispatch
    /// interface has no way to carry more than one.
    pub fn to_workflow_inputs(&self) -> BTreeMap<String, String> {
        let mut inputs = BTreeMap::new();
        inputs.insert("userId".to_string(), self.user_id.clone());
        inputs.insert("createS3".to_string(), self.create_s3.to_string());
        inputs.insert("createRDS".to_string(), self.create_rds.to_string());
        inputs.insert("createEKS".to_string(), self.create_eks.to_string());
        inputs.insert(
            "s3BucketName".to_string(),
            self.s3_bucket_name.clone().unwrap_or_default(),
        );
        inputs.insert(
            "clusterName".to_string(),
            self.cluster_name.clone().unwrap_or_default(),
        );

        if let Some(database) = self.databases.first() {
            inputs.insert("dbName".to_string(), database.db_name.clone());
            inputs.insert("dbUsername".to_string(), database.username.clone());
            inputs.insert("dbPassword".to_string(), database.password.clone());
        }

        inputs
    }
}
