use restruct_api::record::Record;
use restruct_api::transform::Transform;

use crate::config::PipelineConfig;
use crate::error::EngineError;
use crate::plugin_host::PluginRegistry;

struct Stage {
    name: String,
    transform: Box<dyn Transform>,
}

/// Ordered list of configured transforms. Each record goes through every
/// stage in declaration order.
pub struct TransformChain {
    stages: Vec<Stage>,
}

impl std::fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformChain")
            .field("stages", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformChain {
    /// Create every transform declared in `config`.
    ///
    /// Fails on the first transform that cannot be created; nothing is kept
    /// from a partially built chain.
    pub fn build(config: &PipelineConfig, registry: &PluginRegistry) -> Result<Self, EngineError> {
        let mut stages = Vec::with_capacity(config.transforms.len());
        for cfg in &config.transforms {
            let transform = registry.load_transform(cfg)?;
            stages.push(Stage {
                name: cfg.name.clone(),
                transform,
            });
        }
        tracing::info!(stages = stages.len(), "transform chain ready");
        Ok(Self { stages })
    }

    pub fn apply(&self, record: Record) -> Record {
        self.stages
            .iter()
            .fold(record, |record, stage| stage.transform.apply(record))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    /// Release every stage, in reverse order.
    pub fn close(self) {
        for stage in self.stages.into_iter().rev() {
            tracing::debug!(transform = %stage.name, "closing transform");
            stage.transform.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pipeline_is_identity() {
        let chain = TransformChain::build(&PipelineConfig::parse("").unwrap(), &PluginRegistry::builtin()).unwrap();
        assert!(chain.is_empty());
        let record = Record::new("t", None, None, restruct_api::value::Value::from("x"));
        assert_eq!(chain.apply(record.clone()), record);
    }

    #[test]
    fn first_failing_stage_aborts_build() {
        let config = PipelineConfig::parse(
            r#"
            [[transforms]]
            name = "ok"
            plugin = "set-nested-name"
            config = { nested-field-name = "a", new-schema-name = "B" }

            [[transforms]]
            name = "broken"
            plugin = "nest-fields"
            config = { fields-to-nest = "a:b,a:c" }
            "#,
        )
        .unwrap();
        let err = TransformChain::build(&config, &PluginRegistry::builtin()).unwrap_err();
        assert!(err.to_string().contains("transform 'broken'"));
    }
}
