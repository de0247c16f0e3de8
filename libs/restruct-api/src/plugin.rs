use crate::config::{
    parse_string_options, validate_and_build, ConfigParam, ConfigValues,
};
use crate::error::PluginError;
use crate::transform::Transform;

/// Type signature of a plugin's option declaration function.
pub type ConfigParamsFn = fn() -> Vec<ConfigParam>;

/// Type signature of a plugin's constructor. Receives already validated values.
pub type CreateTransformFn = fn(&ConfigValues) -> Result<Box<dyn Transform>, PluginError>;

/// Statically linked transform plugin.
///
/// Each transform crate exports one `PLUGIN` constant; hosts look plugins up by
/// `name`, validate options against `describe_config()` and then create the
/// transform.
#[derive(Clone, Copy)]
pub struct TransformPlugin {
    pub name: &'static str,
    pub description: &'static str,
    pub config_params: ConfigParamsFn,
    pub create: CreateTransformFn,
}

impl TransformPlugin {
    /// Declared options, consumed by the host before configuration.
    pub fn describe_config(&self) -> Vec<ConfigParam> {
        (self.config_params)()
    }

    /// Create a transform from values the host has already validated.
    pub fn create(&self, values: &ConfigValues) -> Result<Box<dyn Transform>, PluginError> {
        (self.create)(values)
    }

    /// Validate a flat string map of options and create the transform.
    ///
    /// Every failure is a configuration error naming the offending option.
    pub fn configure<'a, I>(&self, options: I) -> Result<Box<dyn Transform>, PluginError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params = self.describe_config();
        let parsed = parse_string_options(options, &params)?;
        let values = validate_and_build(&parsed, &params)?;
        let transform = self.create(&values)?;
        tracing::info!(plugin = self.name, options = values.len(), "transform configured");
        Ok(transform)
    }
}

impl std::fmt::Debug for TransformPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPlugin")
            .field("name", &self.name)
            .finish()
    }
}

/// Macro: export a `PLUGIN` descriptor for a transform whose options struct
/// derives `ConfigParams`.
///
/// ```ignore
/// restruct_api::transform_plugin!(
///     "nest-fields",
///     "Wrap top-level fields into single-field structs",
///     NestFieldsConfig,
///     |cfg| NestFields::new(cfg)
/// );
/// ```
#[macro_export]
macro_rules! transform_plugin {
    ($name:expr, $description:expr, $config_type:ty, $ctor:expr) => {
        pub const PLUGIN: $crate::plugin::TransformPlugin = $crate::plugin::TransformPlugin {
            name: $name,
            description: $description,
            config_params: <$config_type>::config_params,
            create: |values| {
                let config = <$config_type>::from_config(values)?;
                let ctor: fn($config_type) -> Result<_, $crate::error::PluginError> = $ctor;
                let transform = ctor(config)?;
                Ok(Box::new(transform) as Box<dyn $crate::transform::Transform>)
            },
        };
    };
}
