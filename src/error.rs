use thiserror::Error;

/// Structural and consistency errors. All but [`HsmError::MissingLca`] are
/// detected while `init` validates the tree; every one is also delivered
/// through the spy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HsmError {
    #[error("initial child `{child}` of `{node}` is not a direct child")]
    InitialChildNotDirect { node: String, child: String },

    #[error("initial child of `{node}` is a history pseudostate")]
    InitialChildIsHistory { node: String },

    #[error("`{node}` has no initial child")]
    MissingInitialChild { node: String },

    #[error("`{node}` can not have region children (`{child}`)")]
    RegionChildForbidden { node: String, child: String },

    #[error("all children of orthogonal `{node}` must be regions (`{child}` is not)")]
    NonRegionChild { node: String, child: String },

    #[error("`{node}` can not have children (`{child}`)")]
    ChildrenNotAllowed { node: String, child: String },

    #[error("transition destination `{dst}` declared on `{node}` is a region")]
    RegionDestination { node: String, dst: String },

    #[error("level computation for `{node}` exceeded the failsafe ceiling")]
    DepthOverflow { node: String },

    #[error("transition from `{src}` has a destination but no common ancestor")]
    MissingLca { src: String },

    #[error("`{op}` called before init")]
    NotInitialized { op: &'static str },
}
