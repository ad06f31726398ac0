//! Provisioning primitives: manager catalog, plan compiler, item presence.
pub mod item;
pub mod package_manager;
pub mod plan;

/// State of a provisioned item on the host.
///
/// # Examples
///
/// ```
/// use jumpstart::resources::ResourceState;
///
/// assert_ne!(ResourceState::Missing, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Not present; the item needs its plan run.
    Missing,
    /// Already present.
    Correct,
}

/// Something whose presence on the host can be checked.
///
/// Checks are read-only and never fail: an item that cannot be found is
/// simply [`ResourceState::Missing`].
pub trait Resource {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Check the current state of the resource.
    fn current_state(&self) -> ResourceState;

    /// Determine if the resource needs to be changed.
    fn needs_change(&self) -> bool {
        self.current_state() == ResourceState::Missing
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    struct TestResource {
        state: ResourceState,
    }

    impl Resource for TestResource {
        fn description(&self) -> String {
            "test resource".to_string()
        }

        fn current_state(&self) -> ResourceState {
            self.state
        }
    }

    #[test]
    fn needs_change_for_missing_resource() {
        let resource = TestResource {
            state: ResourceState::Missing,
        };
        assert!(resource.needs_change());
    }

    #[test]
    fn no_change_for_correct_resource() {
        let resource = TestResource {
            state: ResourceState::Correct,
        };
        assert!(!resource.needs_change());
    }
}
