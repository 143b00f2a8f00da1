//! Deployment pipeline
//!
//! A `Deployment` owns one environment and a worklist of steps. Steps run
//! one at a time; whatever follow-ups a step produces are spliced in ahead
//! of the steps that were already waiting, so a step's expansion finishes
//! before the pipeline moves on.

use anyhow::Result;
use nexus_core::{CommandOutput, DeploymentRecord, EnvironmentKind, Property};
use nexus_store::deployment_repository;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

use crate::environment::{Environment, EnvironmentFactory};
use crate::step::{self, Step};

pub struct Deployment {
    id: Option<i64>,
    environment: Box<dyn Environment>,
    steps: VecDeque<Box<dyn Step>>,
    properties: BTreeMap<Property, String>,
}

impl Deployment {
    /// Wraps an environment; an empty `name` keeps the environment's own
    pub fn new(environment: Box<dyn Environment>, name: &str) -> Result<Self> {
        let mut deployment = Self {
            id: None,
            environment,
            steps: VecDeque::new(),
            properties: BTreeMap::new(),
        };
        if !name.is_empty() {
            deployment.set_property(Property::Name, name)?;
        }
        Ok(deployment)
    }

    /// Queues a step behind everything already pending
    pub fn add_step(&mut self, step: impl Step + 'static) {
        self.steps.push_back(Box::new(step));
    }

    pub fn add_steps(&mut self, steps: impl IntoIterator<Item = Box<dyn Step>>) {
        self.steps.extend(steps);
    }

    /// Names of the steps still waiting, next first
    pub fn pending_steps(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs the head of the worklist
    ///
    /// Returns `None` when nothing is pending.
    pub fn run_next_step(&mut self) -> Option<CommandOutput> {
        let next = self.steps.pop_front()?;
        let report = step::execute(next, self.environment.as_mut());
        let mut result = report.command_output();

        for (key, value) in report.properties {
            match key.parse::<Property>() {
                Ok(property) => {
                    if let Err(e) = self.set_property(property, &value) {
                        warn!("Failed to apply {} from {}: {}", key, report.name, e);
                        result = CommandOutput::failure(format!("Failed to set {}: {}", key, e));
                        break;
                    }
                }
                Err(_) => debug!("Dropping unrecognized property {} from {}", key, report.name),
            }
        }

        if result.is_success() {
            for follow_up in report.next_steps.into_iter().rev() {
                self.steps.push_front(follow_up);
            }
        }

        Some(result)
    }

    /// Runs steps until the worklist is empty or one fails
    ///
    /// Returns the last result seen; an empty worklist is a success.
    pub fn run_all_steps(&mut self) -> CommandOutput {
        let mut last = CommandOutput::default();
        while let Some(result) = self.run_next_step() {
            last = result;
            if !last.is_success() {
                break;
            }
        }
        last
    }

    pub fn property(&self, property: Property) -> Option<&str> {
        match property {
            Property::Name => self.name(),
            _ => self.properties.get(&property).map(String::as_str),
        }
    }

    /// Records a property
    ///
    /// `NAME` on an environment that owns its identity renames the
    /// environment instead of being stored.
    pub fn set_property(&mut self, property: Property, value: &str) -> Result<()> {
        if property == Property::Name && self.environment.kind().owns_identity() {
            return self.environment.set_name(value);
        }
        self.properties.insert(property, value.to_string());
        Ok(())
    }

    /// Every property currently held, `NAME` included
    pub fn properties(&self) -> Vec<(Property, &str)> {
        Property::ALL
            .iter()
            .filter_map(|&p| self.property(p).map(|v| (p, v)))
            .collect()
    }

    pub fn name(&self) -> Option<&str> {
        if self.environment.kind().owns_identity() {
            return self.environment.name();
        }
        self.properties
            .get(&Property::Name)
            .map(String::as_str)
            .or_else(|| self.environment.name())
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    pub fn environment_mut(&mut self) -> &mut dyn Environment {
        self.environment.as_mut()
    }

    /// Writes the deployment to the store, inserting a row on first save
    ///
    /// All writes share one transaction: a rejected value (e.g. a domain
    /// another deployment already holds) leaves the store untouched.
    pub async fn save(&mut self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let kind = self.environment.kind();
        let name = self.name().map(str::to_string);
        let properties: Vec<(Property, String)> = self
            .properties()
            .into_iter()
            .filter(|(p, _)| *p != Property::Name)
            .map(|(p, v)| (p, v.to_string()))
            .collect();

        let mut tx = pool.begin().await?;
        let id = match self.id {
            Some(id) => id,
            None => deployment_repository::insert(&mut *tx, kind).await?,
        };

        if let Some(name) = &name {
            deployment_repository::set_property(&mut *tx, id, Property::Name, name).await?;
        }
        deployment_repository::set_environment(&mut *tx, id, kind).await?;
        for (property, value) in &properties {
            deployment_repository::set_property(&mut *tx, id, *property, value).await?;
        }
        tx.commit().await?;

        self.id = Some(id);
        info!("Saved deployment {} ({})", name.as_deref().unwrap_or("<unnamed>"), id);
        Ok(id)
    }

    /// Removes the stored row matching the current name
    pub async fn delete(&self, pool: &SqlitePool) -> Result<bool, sqlx::Error> {
        let Some(name) = self.name() else {
            return Ok(false);
        };
        let deleted = deployment_repository::delete_by_name(pool, name).await?;
        if deleted {
            info!("Deleted deployment {}", name);
        }
        Ok(deleted)
    }

    /// Rebuilds every stored deployment the factory can open
    pub async fn load_all(
        pool: &SqlitePool,
        factory: &dyn EnvironmentFactory,
    ) -> Result<Vec<Deployment>> {
        let records = deployment_repository::list_all(pool).await?;
        let mut deployments = Vec::with_capacity(records.len());
        for record in records {
            if let Some(deployment) = Self::from_record(record, factory)? {
                deployments.push(deployment);
            }
        }
        Ok(deployments)
    }

    /// Rebuilds one stored deployment by name
    pub async fn load(
        pool: &SqlitePool,
        factory: &dyn EnvironmentFactory,
        name: &str,
    ) -> Result<Option<Deployment>> {
        match deployment_repository::find_by_name(pool, name).await? {
            Some(record) => Self::from_record(record, factory),
            None => Ok(None),
        }
    }

    fn from_record(
        record: DeploymentRecord,
        factory: &dyn EnvironmentFactory,
    ) -> Result<Option<Deployment>> {
        let Ok(kind) = record.environment.parse::<EnvironmentKind>() else {
            debug!("Skipping deployment {}: environment {}", record.id, record.environment);
            return Ok(None);
        };
        let Some(name) = record.name.as_deref() else {
            warn!("Skipping deployment {}: no name", record.id);
            return Ok(None);
        };
        let Some(environment) = factory.open(kind, name)? else {
            debug!("Skipping deployment {}: {} not supported", name, kind);
            return Ok(None);
        };

        let mut deployment = Deployment::new(environment, name)?;
        deployment.id = Some(record.id);
        for property in [Property::Domain, Property::Email] {
            if let Some(value) = record.property(property) {
                deployment.set_property(property, value)?;
            }
        }
        Ok(Some(deployment))
    }
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployment")
            .field("id", &self.id)
            .field("environment", &self.environment.kind())
            .field("pending_steps", &self.pending_steps())
            .field("properties", &self.properties())
            .finish()
    }
}
