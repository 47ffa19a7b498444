// Copyright © 2024 Pathway

pub mod port;
pub use port::{Port, PortDirection, PortId};

pub mod port_set;
pub use port_set::PortSet;

pub mod rules;
pub use rules::{
    pass_through, GenerateNewMetaDataRule, ManyToManyPassThroughRule, Modifier,
    PassThroughRule, PropagationRule, SubsetPassThroughRule,
};
