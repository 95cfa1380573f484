use std::fmt::{Display, Formatter};

use petgraph::graph::NodeIndex;

use crate::{Function, InstId, OpCode, Terminator};

impl Function {
    fn fmt_inst(&self, f: &mut Formatter<'_>, id: InstId) -> std::fmt::Result {
        let inst = self.inst(id);
        match inst.opcode {
            OpCode::Phi => {
                write!(f, "    %{id} = phi {}", inst.ty)?;
                for (pos, value) in inst.operands.iter().enumerate() {
                    write!(f, " [bb{}: {value}]", inst.incoming[pos].index())?;
                }
                writeln!(f, ";")
            }
            OpCode::Store => {
                writeln!(f, "    store {}, {};", inst.operands[0], inst.operands[1])
            }
            OpCode::Call(_) => {
                if inst.ty.is_void() {
                    write!(f, "    {} {}(", inst.opcode, inst.operands[0])?;
                } else {
                    write!(f, "    %{id} = {} {} {}(", inst.opcode, inst.ty, inst.operands[0])?;
                }
                for (pos, arg) in inst.operands[1..].iter().enumerate() {
                    if pos > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                writeln!(f, ");")
            }
            _ => {
                write!(f, "    %{id} = {} {}", inst.opcode, inst.ty)?;
                for (pos, operand) in inst.operands.iter().enumerate() {
                    if pos > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {operand}")?;
                }
                writeln!(f, ";")
            }
        }
    }

    fn fmt_terminator(&self, f: &mut Formatter<'_>, node: NodeIndex) -> std::fmt::Result {
        match &self.block(node).terminator {
            Terminator::Br { dest } => writeln!(f, "    branch bb{};", dest.index()),
            Terminator::CondBr {
                cond,
                then_dest,
                else_dest,
            } => writeln!(
                f,
                "    {cond} ? bb{} : bb{};",
                then_dest.index(),
                else_dest.index()
            ),
            Terminator::Switch {
                value,
                default,
                cases,
            } => {
                write!(f, "    switch {value} [default: bb{}]", default.index())?;
                for (case, dest) in cases {
                    write!(f, " [{case}: bb{}]", dest.index())?;
                }
                writeln!(f, ";")
            }
            Terminator::IndirectBr { address, dests } => {
                write!(f, "    indirect {address} [")?;
                for (pos, dest) in dests.iter().enumerate() {
                    if pos > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "bb{}", dest.index())?;
                }
                writeln!(f, "];")
            }
            Terminator::Ret { value: Some(value) } => writeln!(f, "    return {value};"),
            Terminator::Ret { value: None } => writeln!(f, "    return;"),
            Terminator::None => writeln!(f, "    unterminated;"),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn {}(", self.name())?;
        for (pos, ty) in self.params().iter().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            write!(f, "%a{pos}: {ty}")?;
        }
        writeln!(f, ") {{")?;

        let mut nodes = self.node_ids();
        nodes.sort();
        for node in nodes {
            writeln!(f, "bb{} {{", node.index())?;
            for phi in &self.block(node).phis {
                self.fmt_inst(f, *phi)?;
            }
            for id in &self.block(node).ops {
                self.fmt_inst(f, *id)?;
            }
            self.fmt_terminator(f, node)?;
            writeln!(f, "}}\n")?;
        }
        write!(f, "}}")
    }
}
