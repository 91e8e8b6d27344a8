/// Represents a configuration that can be validated or resolved.
pub trait ResolvableConfiguration {
    type Resolved;
    type Error;

    /// Resolve the configuration into its `Resolved` type.
    /// If the resolution / validation fails, you may return `Err` to indicate
    /// that the configuration is invalid.
    fn resolve(self) -> Result<Self::Resolved, Self::Error>;
}


/// Represents a configuration that can be validated or resolved,
/// but where that process requires some additional context
/// (e.g. the project root relative locations are anchored to).
pub trait ResolvableConfigurationWithContext {
    type Context;
    type Resolved;
    type Error;

    /// Resolve the configuration into its `Resolved` type.
    /// If the resolution / validation fails, you may return `Err` to indicate
    /// that the configuration is invalid.
    fn resolve(self, context: Self::Context) -> Result<Self::Resolved, Self::Error>;
}
