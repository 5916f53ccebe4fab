use std::ops::ControlFlow;

use tracing::{debug, warn};

use super::crypto::RingVerifier;
use super::delegation::{DelegationStatus, update_delegation};
use super::denial::NsecDenialChecker;
use super::errors::{DenialError, Result, ValidationError};
use super::keyset::{KeysetUpdate, update_keyset};
use super::outcome::{Outcome, YieldReason};
use super::query::{Query, QueryFlags, QueryId, Request, ResolutionPlan};
use super::review::check_validation_result;
use super::section::validate_records;
use super::signer::check_signer;
use super::verifier::{DenialChecker, RrsetVerifier};
use crate::config::ValidatorConfig;
use crate::dns::enums::{DNSResourceType, ResponseCode};
use crate::dns::{DNSPacket, Section};
use crate::layer::LayerState;

/// DNSSEC validation step of the resolver pipeline.
///
/// Runs once per response, after the response has been parsed and its
/// records selected into the request's ranked arrays. Signature checks and
/// denial proofs are delegated to the configured [`RrsetVerifier`] and
/// [`DenialChecker`].
pub struct Validator {
    verifier: Box<dyn RrsetVerifier>,
    denial: Box<dyn DenialChecker>,
}

impl Validator {
    pub fn new(verifier: Box<dyn RrsetVerifier>, denial: Box<dyn DenialChecker>) -> Self {
        Self { verifier, denial }
    }

    /// Validator backed by ring signatures and the built-in NSEC/NSEC3
    /// proofs
    pub fn from_config(config: &ValidatorConfig) -> Self {
        let mut verifier = RingVerifier::new();
        if let Some(now) = config.time_override {
            verifier.set_current_time(now);
        }
        Self::new(
            Box::new(verifier),
            Box::new(NsecDenialChecker::new(config.max_nsec3_iterations)),
        )
    }

    /// Validate `packet` for the request's current query.
    ///
    /// `state` is the pipeline state before this step; failed or
    /// still-consuming responses pass through untouched and a `Yield` state
    /// means this query was already suspended once.
    pub fn process_response(
        &self,
        req: &mut Request,
        packet: &DNSPacket,
        state: LayerState,
    ) -> Outcome {
        if matches!(state, LayerState::Fail | LayerState::Consume) {
            return Outcome::PassThrough;
        }

        let outcome = match self.validate(req, packet, state) {
            ControlFlow::Break(outcome) => outcome,
            ControlFlow::Continue(()) => Outcome::Done,
        };

        if let Some(qry) = req.plan.get_mut(req.current) {
            settle(qry, &outcome);
        }
        outcome
    }

    fn validate(&self, req: &mut Request, packet: &DNSPacket, state: LayerState) -> ControlFlow<Outcome> {
        let current = req.current;
        let Some(qry) = req.plan.get_mut(current) else {
            return ControlFlow::Break(ValidationError::UnknownQuery(current).into());
        };

        if !qry.wants_dnssec() || qry.flags.contains(QueryFlags::STUB) {
            return ControlFlow::Break(Outcome::PassThrough);
        }

        let cached = qry.flags.contains(QueryFlags::CACHED);
        let qtype = packet.qtype().unwrap_or(qry.qtype);
        let has_nsec3 = packet.has_type(DNSResourceType::NSEC3);

        debug!(
            qname = %qry.sname,
            qtype = %qtype,
            cut = %qry.zone_cut.name,
            cached,
            "validating response"
        );

        if !cached && !packet.dnssec_requested() && qtype != DNSResourceType::RRSIG {
            debug!(qname = %qry.sname, qtype = %qtype, "response has no DNSSEC records");
            return ControlFlow::Break(ValidationError::InsecureResponse.into());
        }

        if packet.is_authoritative() && qtype == DNSResourceType::DNSKEY {
            if !cached {
                check_signer(qry, &req.cuts, &req.answer_selected, &req.auth_selected, state).flow()?;
            }
            match update_keyset(qry, packet, has_nsec3, self.verifier.as_ref()) {
                Ok(KeysetUpdate::Accepted { wildcard_expanded }) => {
                    if wildcard_expanded {
                        qry.flags.insert(QueryFlags::DNSSEC_WEXPAND);
                    }
                }
                Ok(KeysetUpdate::CutMismatch) => {
                    return ControlFlow::Break(Outcome::Yield(YieldReason::RefetchKeys));
                }
                Err(e) => return ControlFlow::Break(e.into()),
            }
        }

        if !cached {
            self.check_denial(qry, packet, qtype, has_nsec3).flow()?;

            let status = match validate_records(
                qry,
                packet,
                &mut req.answer_selected,
                &mut req.auth_selected,
                self.verifier.as_ref(),
            ) {
                Ok(status) => status,
                Err(e) => {
                    warn!(qname = %qry.sname, qtype = %qtype, error = %e, "couldn't validate records");
                    return ControlFlow::Break(e.into());
                }
            };
            if status.unsigned {
                debug!(qname = %qry.sname, qtype = %qtype, "no RRSIG in response, asking for DS");
                return ControlFlow::Break(Outcome::Yield(YieldReason::FetchDs));
            }
            if status.wildcard_expanded {
                qry.flags.insert(QueryFlags::DNSSEC_WEXPAND);
            }

            check_validation_result(qry, &mut req.cuts, &req.answer_selected, state).flow()?;
            check_validation_result(qry, &mut req.cuts, &req.auth_selected, state).flow()?;
        }

        // Wildcard answers of the top query carry their denial proof
        if qry.parent.is_none() && qry.flags.contains(QueryFlags::DNSSEC_WEXPAND) {
            req.auth_selected.set_wire(true, qry.id);
        }

        match update_delegation(qry, packet, has_nsec3, self.denial.as_ref()) {
            Ok(DelegationStatus::ProvenInsecure) => qry.go_insecure(),
            Ok(_) => {}
            Err(e) => return ControlFlow::Break(e.into()),
        }

        let sname = qry.sname.clone();
        if qry.parent.is_some() {
            if let Err(e) = update_parent_keys(&mut req.plan, current, qtype) {
                warn!(qname = %sname, qtype = %qtype, error = %e, "couldn't hand key material to parent query");
                return ControlFlow::Break(e.into());
            }
        }

        debug!(qname = %sname, qtype = %qtype, "DNSSEC validation done");
        ControlFlow::Continue(())
    }

    /// NXDOMAIN and NODATA proofs of authoritative negative answers
    fn check_denial(&self, qry: &mut Query, packet: &DNSPacket, qtype: DNSResourceType, has_nsec3: bool) -> Outcome {
        match packet.rcode() {
            ResponseCode::NameError => {
                let proof = if has_nsec3 {
                    self.denial.nsec3_name_error(packet, Section::Authority, &qry.sname)
                } else {
                    self.denial.nsec_name_error(packet, Section::Authority, &qry.sname)
                };
                if let Err(e) = proof {
                    debug!(qname = %qry.sname, qtype = %qtype, error = %e, "bad NXDOMAIN proof");
                    return ValidationError::BadNameErrorProof(e).into();
                }
            }
            ResponseCode::NoError if packet.answers.is_empty() && packet.is_authoritative() => {
                let qname = packet.qname();
                let proof = if has_nsec3 {
                    self.denial.nsec3_no_data(packet, Section::Authority, &qname, qtype)
                } else {
                    self.denial.nsec_existence_denial(packet, Section::Authority, &qname, qtype)
                };
                match proof {
                    Ok(()) => {}
                    Err(DenialError::OptOut) if has_nsec3 => {
                        debug!(qname = %qname, qtype = %qtype, "NSEC3 opt-out covers name, going insecure");
                        qry.go_insecure();
                    }
                    Err(e) => {
                        debug!(qname = %qname, qtype = %qtype, error = %e, "bad NODATA proof");
                        return ValidationError::BadNoDataProof(e).into();
                    }
                }
            }
            _ => {}
        }
        Outcome::Continue
    }
}

/// Hand the key material a DNSKEY or DS sub-query learned to the query it
/// serves
fn update_parent_keys(plan: &mut ResolutionPlan, child: QueryId, qtype: DNSResourceType) -> Result<()> {
    let Some((child, parent)) = plan.with_parent_mut(child) else {
        return Err(ValidationError::UnknownQuery(child));
    };

    match qtype {
        DNSResourceType::DS if child.flags.contains(QueryFlags::DNSSEC_INSECURE) => {
            debug!(
                qname = %child.sname,
                qtype = %qtype,
                parent = %parent.sname,
                "unsigned delegation, parent query goes insecure"
            );
            parent.go_insecure();
        }
        DNSResourceType::DNSKEY | DNSResourceType::DS => {
            let material = child
                .zone_cut
                .material(qtype)
                .cloned()
                .ok_or(ValidationError::MissingKeyMaterial(qtype))?;
            if qtype == DNSResourceType::DNSKEY {
                parent.zone_cut.key = Some(material);
            } else {
                parent.zone_cut.trust_anchor = Some(material);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Record an outcome on the query's flags
fn settle(qry: &mut Query, outcome: &Outcome) {
    match outcome {
        Outcome::Fail(e) if e.is_bogus() => {
            warn!(qname = %qry.sname, qtype = %qry.qtype, error = %e, "bogus");
            qry.flags.insert(QueryFlags::DNSSEC_BOGUS);
        }
        Outcome::Fail(e) => warn!(qname = %qry.sname, qtype = %qry.qtype, error = %e, "validation failed"),
        Outcome::Yield(YieldReason::AwaitCut) => {
            debug!(qname = %qry.sname, qtype = %qry.qtype, cut = %qry.zone_cut.name, "waiting for zone cut");
            qry.flags.insert(QueryFlags::AWAIT_CUT);
        }
        Outcome::Yield(reason) => debug!(qname = %qry.sname, qtype = %qry.qtype, ?reason, "yield"),
        _ => {}
    }
}
