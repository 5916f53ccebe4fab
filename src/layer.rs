//! Response-processing pipeline seam.
//!
//! The resolver runs each received packet through its registered layers in
//! order. Every layer sees the state the pipeline is in and reports an
//! [`Outcome`], which moves the pipeline to its next state.

use tracing::{debug, trace};

use crate::config::ValidatorConfig;
use crate::dns::DNSPacket;
use crate::dnssec::{Outcome, Request, Validator, YieldReason};

/// State of the pipeline when a layer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerState {
    /// More input is expected before the packet is complete
    #[default]
    Consume,
    /// A query is ready to be sent
    Produce,
    Done,
    Fail,
    /// The current query was suspended for missing data
    Yield,
}

impl LayerState {
    /// State after a layer reported `outcome`
    pub fn advance(self, outcome: &Outcome) -> LayerState {
        match outcome {
            Outcome::PassThrough => self,
            Outcome::Continue | Outcome::Done => LayerState::Done,
            Outcome::Yield(_) => LayerState::Yield,
            Outcome::Fail(_) => LayerState::Fail,
        }
    }
}

pub trait Layer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Process a received packet for the request's current query
    fn consume(&self, req: &mut Request, packet: &DNSPacket, state: LayerState) -> Outcome;
}

impl Layer for Validator {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn consume(&self, req: &mut Request, packet: &DNSPacket, state: LayerState) -> Outcome {
        self.process_response(req, packet, state)
    }
}

/// Result of running a packet through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub state: LayerState,
    /// What the last suspending layer is waiting for
    pub yield_reason: Option<YieldReason>,
}

#[derive(Default)]
pub struct Pipeline {
    layers: Vec<Box<dyn Layer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, layer: Box<dyn Layer>) {
        debug!("Registering layer {}", layer.name());
        self.layers.push(layer);
    }

    pub fn layers(&self) -> impl Iterator<Item = &dyn Layer> {
        self.layers.iter().map(|l| l.as_ref())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run `packet` through every layer starting from `state`
    pub fn consume(&self, req: &mut Request, packet: &DNSPacket, state: LayerState) -> PipelineResult {
        let mut result = PipelineResult {
            state,
            yield_reason: None,
        };

        for layer in &self.layers {
            let outcome = layer.consume(req, packet, result.state);
            trace!("Layer {} returned {:?}", layer.name(), outcome);
            if let Outcome::Yield(reason) = outcome {
                result.yield_reason = Some(reason);
            }
            result.state = result.state.advance(&outcome);
        }

        result
    }
}

/// Add the validator to `pipeline` unless disabled by configuration
pub fn register(pipeline: &mut Pipeline, config: &ValidatorConfig) -> bool {
    if !config.enabled {
        debug!("DNSSEC validation disabled");
        return false;
    }
    pipeline.register(Box::new(Validator::from_config(config)));
    true
}
