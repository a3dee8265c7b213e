//! The set of providers and goals this binary knows about.

use std::collections::BTreeMap;
use std::sync::Arc;

use metagen_client::{Goal, Provider};

use crate::goals::fabric::FabricIntermediary;
use crate::goals::java::{AdoptiumJava, AzulJava, MojangJava};
use crate::goals::minecraft::Minecraft;
use crate::goals::neoforge::NeoForge;
use crate::providers::adoptium::AdoptiumVersions;
use crate::providers::azul::AzulVersions;
use crate::providers::fabric::IntermediaryVersions;
use crate::providers::mojang::{GameVersions, JavaRuntimes};
use crate::providers::neoforge::LoaderVersions;

pub struct Registry {
    providers: BTreeMap<&'static str, Arc<dyn Provider>>,
    goals: BTreeMap<&'static str, Arc<dyn Goal>>,
}

impl Registry {
    pub fn new() -> Self {
        let game_versions = Arc::new(GameVersions);
        let intermediary_versions = Arc::new(IntermediaryVersions);
        let loader_versions = Arc::new(LoaderVersions);
        let mojang_java = Arc::new(JavaRuntimes);
        let adoptium_java = Arc::new(AdoptiumVersions);
        let azul_java = Arc::new(AzulVersions);

        let providers: [Arc<dyn Provider>; 6] = [
            game_versions.clone(),
            intermediary_versions.clone(),
            loader_versions.clone(),
            mojang_java.clone(),
            adoptium_java.clone(),
            azul_java.clone(),
        ];
        let goals: [Arc<dyn Goal>; 6] = [
            Arc::new(Minecraft::new(game_versions.clone())),
            Arc::new(FabricIntermediary::new(intermediary_versions)),
            Arc::new(NeoForge::new(loader_versions, game_versions)),
            Arc::new(MojangJava::new(mojang_java)),
            Arc::new(AdoptiumJava::new(adoptium_java)),
            Arc::new(AzulJava::new(azul_java)),
        ];

        Self {
            providers: providers.into_iter().map(|p| (p.id(), p)).collect(),
            goals: goals.into_iter().map(|g| (g.id(), g)).collect(),
        }
    }

    pub fn provider(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(id).cloned()
    }

    pub fn goal(&self, id: &str) -> Option<Arc<dyn Goal>> {
        self.goals.get(id).cloned()
    }

    pub fn all_providers(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.values().cloned().collect()
    }

    pub fn all_goals(&self) -> Vec<Arc<dyn Goal>> {
        self.goals.values().cloned().collect()
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.keys().copied().collect()
    }

    pub fn goal_ids(&self) -> Vec<&'static str> {
        self.goals.keys().copied().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
