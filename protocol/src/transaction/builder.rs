//! Transaction construction via the builder pattern.
//!
//! Two layers, mirroring how the chain itself splits a transaction:
//!
//! - [`ProgrammableTransactionBuilder`] collects inputs and commands and
//!   hands out [`Argument`] handles that later commands can consume.
//! - [`TransactionBuilder`] wraps the finished programmable transaction with
//!   sender and gas data and produces an unsigned [`TransactionData`].
//!
//! The builder does not sign. That happens in [`super::signing`], usually on
//! a different machine than the one that built the bytes.

use std::collections::HashMap;

use serde::Serialize;

use super::types::{
    Argument, CallArg, Command, GasData, ObjectArg, ProgrammableMoveCall, ProgrammableTransaction,
    TransactionData, TransactionDataV1, TransactionExpiration, TransactionKind, TypeTag,
};
use super::{BuildError, BuildResult};
use crate::types::{ObjectId, ObjectRef, SuiAddress};

// ---------------------------------------------------------------------------
// ProgrammableTransactionBuilder
// ---------------------------------------------------------------------------

/// Accumulates inputs and commands for one programmable transaction.
///
/// Object inputs are deduplicated by id: passing the same object twice
/// yields the same [`Argument::Input`], and a shared object requested once
/// mutably stays mutable.
#[derive(Debug, Default)]
pub struct ProgrammableTransactionBuilder {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
    objects: HashMap<ObjectId, u16>,
}

impl ProgrammableTransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_input(&mut self, arg: CallArg) -> BuildResult<u16> {
        let index = u16::try_from(self.inputs.len())
            .map_err(|_| BuildError::InvalidArgument("too many transaction inputs".into()))?;
        self.inputs.push(arg);
        Ok(index)
    }

    /// Adds a BCS-encoded pure input.
    pub fn pure<T: Serialize>(&mut self, value: &T) -> BuildResult<Argument> {
        let bytes = bcs::to_bytes(value).map_err(|e| BuildError::Encoding(e.to_string()))?;
        Ok(Argument::Input(self.push_input(CallArg::Pure(bytes))?))
    }

    pub fn pure_u64(&mut self, value: u64) -> BuildResult<Argument> {
        self.pure(&value)
    }

    /// Adds an object input, reusing the existing slot if the object is
    /// already an input.
    pub fn object(&mut self, arg: ObjectArg) -> BuildResult<Argument> {
        let id = arg.id();
        if let Some(&index) = self.objects.get(&id) {
            if let (
                CallArg::Object(ObjectArg::SharedObject { mutable, .. }),
                ObjectArg::SharedObject { mutable: true, .. },
            ) = (&mut self.inputs[usize::from(index)], &arg)
            {
                *mutable = true;
            }
            return Ok(Argument::Input(index));
        }
        let index = self.push_input(CallArg::Object(arg))?;
        self.objects.insert(id, index);
        Ok(Argument::Input(index))
    }

    /// Appends a command and returns a handle to its result.
    pub fn command(&mut self, command: Command) -> BuildResult<Argument> {
        let index = u16::try_from(self.commands.len())
            .map_err(|_| BuildError::InvalidArgument("too many commands".into()))?;
        self.commands.push(command);
        Ok(Argument::Result(index))
    }

    /// Splits `amount` MIST off the gas coin and returns the new coin.
    pub fn split_gas(&mut self, amount: u64) -> BuildResult<Argument> {
        let amount = self.pure_u64(amount)?;
        match self.command(Command::SplitCoins(Argument::GasCoin, vec![amount]))? {
            Argument::Result(index) => Ok(Argument::NestedResult(index, 0)),
            other => Ok(other),
        }
    }

    pub fn move_call(
        &mut self,
        package: ObjectId,
        module: impl Into<String>,
        function: impl Into<String>,
        type_arguments: Vec<TypeTag>,
        arguments: Vec<Argument>,
    ) -> BuildResult<Argument> {
        self.command(Command::MoveCall(Box::new(ProgrammableMoveCall {
            package,
            module: module.into(),
            function: function.into(),
            type_arguments,
            arguments,
        })))
    }

    pub fn finish(self) -> ProgrammableTransaction {
        ProgrammableTransaction {
            inputs: self.inputs,
            commands: self.commands,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for an unsigned [`TransactionData`].
///
/// ```rust,no_run
/// use microloan_protocol::transaction::{ProgrammableTransactionBuilder, TransactionBuilder};
/// # fn demo(coin: microloan_protocol::types::ObjectRef) -> Result<(), Box<dyn std::error::Error>> {
/// let mut ptb = ProgrammableTransactionBuilder::new();
/// let split = ptb.split_gas(1_000)?;
/// let tx = TransactionBuilder::new(ptb.finish())
///     .sender("0xabc".parse()?)
///     .gas_payment(coin)
///     .gas_price(1_000)
///     .gas_budget(50_000_000)
///     .build()?;
/// # let _ = (split, tx);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    kind: ProgrammableTransaction,
    sender: Option<SuiAddress>,
    gas_payment: Vec<ObjectRef>,
    gas_price: Option<u64>,
    gas_budget: Option<u64>,
}

impl TransactionBuilder {
    pub fn new(kind: ProgrammableTransaction) -> Self {
        Self {
            kind,
            sender: None,
            gas_payment: Vec::new(),
            gas_price: None,
            gas_budget: None,
        }
    }

    /// Sets the sender. The sender also owns the gas.
    pub fn sender(mut self, sender: SuiAddress) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Adds a gas payment coin.
    pub fn gas_payment(mut self, coin: ObjectRef) -> Self {
        self.gas_payment.push(coin);
        self
    }

    pub fn gas_price(mut self, price: u64) -> Self {
        self.gas_price = Some(price);
        self
    }

    pub fn gas_budget(mut self, budget: u64) -> Self {
        self.gas_budget = Some(budget);
        self
    }

    /// Consumes the builder and produces the unsigned transaction.
    pub fn build(self) -> BuildResult<TransactionData> {
        let sender = self.sender.ok_or(BuildError::MissingField("sender"))?;
        if self.gas_payment.is_empty() {
            return Err(BuildError::MissingField("gas payment"));
        }
        let price = self.gas_price.ok_or(BuildError::MissingField("gas price"))?;
        let budget = self.gas_budget.ok_or(BuildError::MissingField("gas budget"))?;

        Ok(TransactionData::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(self.kind),
            sender,
            gas_data: GasData {
                payment: self.gas_payment,
                owner: sender,
                price,
                budget,
            },
            expiration: TransactionExpiration::None,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectDigest;

    fn coin_ref() -> ObjectRef {
        ObjectRef {
            object_id: "0xc01".parse().unwrap(),
            version: 3,
            digest: ObjectDigest::new([4u8; 32]),
        }
    }

    fn shared(id: &str, mutable: bool) -> ObjectArg {
        ObjectArg::SharedObject {
            id: id.parse().unwrap(),
            initial_shared_version: 11,
            mutable,
        }
    }

    #[test]
    fn split_gas_yields_nested_result() {
        let mut ptb = ProgrammableTransactionBuilder::new();
        let coin = ptb.split_gas(1_000).unwrap();
        assert_eq!(coin, Argument::NestedResult(0, 0));
        let pt = ptb.finish();
        assert_eq!(pt.inputs, vec![CallArg::Pure(1_000u64.to_le_bytes().to_vec())]);
        assert_eq!(
            pt.commands,
            vec![Command::SplitCoins(Argument::GasCoin, vec![Argument::Input(0)])]
        );
    }

    #[test]
    fn objects_are_deduplicated_and_upgraded_to_mutable() {
        let mut ptb = ProgrammableTransactionBuilder::new();
        let a = ptb.object(shared("0x10", false)).unwrap();
        let b = ptb.object(shared("0x10", true)).unwrap();
        assert_eq!(a, b);
        let pt = ptb.finish();
        assert_eq!(pt.inputs, vec![CallArg::Object(shared("0x10", true))]);
    }

    #[test]
    fn move_call_records_target_and_arguments() {
        let package: ObjectId = "0x99".parse().unwrap();
        let mut ptb = ProgrammableTransactionBuilder::new();
        let coin = ptb.split_gas(5).unwrap();
        let rate = ptb.pure_u64(500).unwrap();
        ptb.move_call(package, "microloan", "create_loan", vec![], vec![coin, rate])
            .unwrap();
        let pt = ptb.finish();
        let call = pt.move_calls().next().unwrap();
        assert_eq!(call.package, package);
        assert_eq!(call.function, "create_loan");
        assert_eq!(call.arguments, vec![Argument::NestedResult(0, 0), Argument::Input(1)]);
    }

    #[test]
    fn build_requires_sender_gas_and_price() {
        let empty = || ProgrammableTransactionBuilder::new().finish();
        assert!(matches!(
            TransactionBuilder::new(empty()).build(),
            Err(BuildError::MissingField("sender"))
        ));
        assert!(matches!(
            TransactionBuilder::new(empty())
                .sender("0x1".parse().unwrap())
                .build(),
            Err(BuildError::MissingField("gas payment"))
        ));

        let tx = TransactionBuilder::new(empty())
            .sender("0x1".parse().unwrap())
            .gas_payment(coin_ref())
            .gas_price(750)
            .gas_budget(10)
            .build()
            .unwrap();
        assert_eq!(tx.gas_data().payment, vec![coin_ref()]);
        assert_eq!(tx.gas_data().owner, tx.sender());
        assert_eq!(tx.gas_data().price, 750);
    }
}
