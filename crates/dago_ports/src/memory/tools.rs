use crate::error::{PortError, PortResult};
use crate::tools::{ToolExecutor, ToolRegistry, ToolType};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// [`ToolRegistry`] backed by an insertion-ordered map.
#[derive(Default)]
pub struct InMemoryToolRegistry {
    tools: RwLock<IndexMap<String, Arc<dyn ToolExecutor>>>,
}

impl core::fmt::Debug for InMemoryToolRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}

impl InMemoryToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToolRegistry for InMemoryToolRegistry {
    fn register(&self, name: &str, executor: Arc<dyn ToolExecutor>) -> PortResult<()> {
        let mut tools = self.tools.write();
        if tools.contains_key(name) {
            return Err(PortError::AlreadyExists(format!("tool '{name}'")));
        }
        tracing::debug!(tool = name, tool_type = %executor.tool_type(), "tool registered");
        tools.insert(name.to_string(), executor);
        Ok(())
    }

    fn get(&self, name: &str) -> PortResult<Arc<dyn ToolExecutor>> {
        self.tools
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PortError::not_found(format!("tool '{name}'")))
    }

    fn list(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    fn unregister(&self, name: &str) -> PortResult<()> {
        self.tools
            .write()
            .shift_remove(name)
            .map(drop)
            .ok_or_else(|| PortError::not_found(format!("tool '{name}'")))
    }

    fn by_type(&self, tool_type: ToolType) -> Vec<Arc<dyn ToolExecutor>> {
        self.tools
            .read()
            .values()
            .filter(|tool| tool.tool_type() == tool_type)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolResult, ToolSchema};
    use async_trait::async_trait;
    use core::time::Duration;
    use dago_domain::ToolError;
    use serde_json::{Value, json};

    struct Echo(ToolType);

    #[async_trait]
    impl ToolExecutor for Echo {
        async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
            self.validate(&params)?;
            Ok(ToolResult::success(params, Duration::from_millis(1)))
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("echo", "Returns its input", json!({"type": "object"}))
        }

        fn tool_type(&self) -> ToolType {
            self.0
        }

        fn validate(&self, params: &Value) -> Result<(), ToolError> {
            if params.is_object() {
                Ok(())
            } else {
                Err(ToolError::new("echo", "params must be an object"))
            }
        }
    }

    #[test]
    fn register_get_list_unregister() {
        let registry = InMemoryToolRegistry::new();
        registry.register("echo", Arc::new(Echo(ToolType::Custom))).unwrap();
        registry.register("sh", Arc::new(Echo(ToolType::Bash))).unwrap();
        assert!(matches!(
            registry.register("echo", Arc::new(Echo(ToolType::Custom))),
            Err(PortError::AlreadyExists(_))
        ));

        assert_eq!(registry.list(), ["echo", "sh"]);
        assert_eq!(registry.by_type(ToolType::Bash).len(), 1);
        assert!(registry.by_type(ToolType::Http).is_empty());
        assert_eq!(registry.get("echo").unwrap().schema().name, "echo");

        registry.unregister("echo").unwrap();
        assert!(matches!(registry.get("echo"), Err(PortError::NotFound(_))));
        assert!(registry.unregister("echo").is_err());
    }

    #[tokio::test]
    async fn executor_validates_before_running() {
        let registry = InMemoryToolRegistry::new();
        registry.register("echo", Arc::new(Echo(ToolType::Custom))).unwrap();
        let tool = registry.get("echo").unwrap();

        let result = tool.execute(json!({"x": 1})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, Some(json!({"x": 1})));

        let err = tool.execute(json!([1])).await.unwrap_err();
        assert_eq!(err.tool_name, "echo");
    }
}
