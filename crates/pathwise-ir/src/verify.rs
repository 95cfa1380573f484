use std::collections::HashMap;

use petgraph::algo::dominators::{self, Dominators};
use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::{Function, InstId, Terminator, Value};

/// Structural defect found by [`Function::verify`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("bb{block} has no terminator")]
    MissingTerminator { block: usize },
    #[error("bb{block} terminator targets do not match its graph successors")]
    EdgeMismatch { block: usize },
    #[error("entry block has predecessors")]
    EntryHasPreds,
    #[error("%{inst} references erased instruction %{operand}")]
    DanglingOperand { inst: InstId, operand: InstId },
    #[error("%{inst} uses %{operand} which does not dominate it")]
    UseNotDominated { inst: InstId, operand: InstId },
    #[error("bb{block} terminator uses %{operand} before it is defined")]
    TerminatorUse { block: usize, operand: InstId },
    #[error("phi %{phi} incoming blocks do not match the predecessors of bb{block}")]
    PhiIncomingMismatch { phi: InstId, block: usize },
    #[error("use of parameter {index} which the function does not have")]
    InvalidArg { index: u16 },
}

impl Function {
    /// Check SSA well-formedness: terminated blocks whose edges match their
    /// terminators, no dangling operands, uses dominated by definitions and
    /// phi inputs matching predecessors. Unreachable blocks are only
    /// checked for dangling references.
    pub fn verify(&self) -> Result<(), VerifyError> {
        if !self.predecessors(self.entry()).is_empty() {
            return Err(VerifyError::EntryHasPreds);
        }
        for node in self.node_ids() {
            let block = self.block(node);
            if block.terminator == Terminator::None {
                return Err(VerifyError::MissingTerminator {
                    block: node.index(),
                });
            }
            let mut targets: Vec<_> = block.terminator.targets().into_vec();
            let mut successors = self.successors(node);
            targets.sort();
            successors.sort();
            if targets != successors {
                return Err(VerifyError::EdgeMismatch {
                    block: node.index(),
                });
            }
        }

        let doms = dominators::simple_fast(self.graph(), self.entry());
        let positions = self.body_positions();
        for node in self.node_ids() {
            let reachable = self.is_reachable(&doms, node);
            for (pos, id) in self.block(node).ops.iter().enumerate() {
                for operand in &self.inst(*id).operands {
                    self.check_operand(&doms, &positions, *id, *operand, node, pos, reachable)?;
                }
            }
            self.verify_phis(&doms, node, reachable)?;
            if let Some(operand) = self.block(node).terminator.operand() {
                self.check_terminator_operand(&doms, *operand, node, reachable)?;
            }
        }
        Ok(())
    }

    fn verify_phis(
        &self,
        doms: &Dominators<NodeIndex>,
        node: NodeIndex,
        reachable: bool,
    ) -> Result<(), VerifyError> {
        let mut preds = self.predecessors(node);
        preds.sort();
        for phi in self.phi_ids(node) {
            let inst = self.inst(phi);
            let mut incoming: Vec<_> = inst.incoming.to_vec();
            incoming.sort();
            if incoming != preds {
                return Err(VerifyError::PhiIncomingMismatch {
                    phi,
                    block: node.index(),
                });
            }
            for (pos, operand) in inst.operands.iter().enumerate() {
                let pred = inst.incoming[pos];
                match operand {
                    Value::Inst(def) => {
                        if !self.contains_inst(*def) {
                            return Err(VerifyError::DanglingOperand {
                                inst: phi,
                                operand: *def,
                            });
                        }
                        // the value flows in over the edge, so it must be
                        // live at the end of the incoming block
                        let def_block = self.inst(*def).block();
                        if reachable
                            && self.is_reachable(doms, pred)
                            && !dominates(doms, def_block, pred)
                        {
                            return Err(VerifyError::UseNotDominated {
                                inst: phi,
                                operand: *def,
                            });
                        }
                    }
                    Value::Arg(index) => self.check_arg(*index)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn check_operand(
        &self,
        doms: &Dominators<NodeIndex>,
        positions: &HashMap<InstId, usize>,
        user: InstId,
        operand: Value,
        node: NodeIndex,
        pos: usize,
        reachable: bool,
    ) -> Result<(), VerifyError> {
        match operand {
            Value::Inst(def) => {
                if !self.contains_inst(def) {
                    return Err(VerifyError::DanglingOperand {
                        inst: user,
                        operand: def,
                    });
                }
                if !reachable {
                    return Ok(());
                }
                let def_data = self.inst(def);
                let ok = if def_data.block() == node {
                    def_data.is_phi() || positions[&def] < pos
                } else {
                    dominates(doms, def_data.block(), node)
                };
                if !ok {
                    return Err(VerifyError::UseNotDominated {
                        inst: user,
                        operand: def,
                    });
                }
            }
            Value::Arg(index) => self.check_arg(index)?,
            _ => {}
        }
        Ok(())
    }

    fn check_terminator_operand(
        &self,
        doms: &Dominators<NodeIndex>,
        operand: Value,
        node: NodeIndex,
        reachable: bool,
    ) -> Result<(), VerifyError> {
        match operand {
            Value::Inst(def) => {
                if !self.contains_inst(def) {
                    return Err(VerifyError::TerminatorUse {
                        block: node.index(),
                        operand: def,
                    });
                }
                if !reachable {
                    return Ok(());
                }
                // the terminator reads after every instruction in the block
                let def_block = self.inst(def).block();
                if def_block != node && !dominates(doms, def_block, node) {
                    return Err(VerifyError::TerminatorUse {
                        block: node.index(),
                        operand: def,
                    });
                }
            }
            Value::Arg(index) => self.check_arg(index)?,
            _ => {}
        }
        Ok(())
    }

    fn check_arg(&self, index: u16) -> Result<(), VerifyError> {
        if index as usize >= self.params().len() {
            return Err(VerifyError::InvalidArg { index });
        }
        Ok(())
    }

    fn body_positions(&self) -> HashMap<InstId, usize> {
        let mut positions = HashMap::new();
        for node in self.node_ids() {
            for (pos, id) in self.block(node).ops.iter().enumerate() {
                positions.insert(*id, pos);
            }
        }
        positions
    }

    fn is_reachable(&self, doms: &Dominators<NodeIndex>, node: NodeIndex) -> bool {
        node == self.entry() || doms.immediate_dominator(node).is_some()
    }
}

/// Whether `a` dominates `b`, walking `b`'s immediate-dominator chain.
fn dominates(doms: &Dominators<NodeIndex>, a: NodeIndex, b: NodeIndex) -> bool {
    let mut current = b;
    loop {
        if current == a {
            return true;
        }
        match doms.immediate_dominator(current) {
            Some(idom) => current = idom,
            None => return false,
        }
    }
}
