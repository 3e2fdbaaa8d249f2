use crate::domain::payment::Payment;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PaymentRecord<'a> {
    order: &'a str,
    state: &'static str,
    amount: Decimal,
    refunded: Decimal,
    currency: &'a str,
    remote_id: &'a str,
    remote_state: &'a str,
}

impl<'a> From<&'a Payment> for PaymentRecord<'a> {
    fn from(payment: &'a Payment) -> Self {
        Self {
            order: &payment.order_id,
            state: payment.state.as_str(),
            amount: payment.amount.number,
            refunded: payment.refunded_amount.number,
            currency: &payment.amount.currency,
            remote_id: &payment.remote_id,
            remote_state: &payment.remote_state,
        }
    }
}

/// Writes the payment report as CSV.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes one row per payment, header included, and flushes.
    pub fn write_payments(&mut self, payments: &[Payment]) -> Result<()> {
        if payments.is_empty() {
            self.writer.write_record([
                "order",
                "state",
                "amount",
                "refunded",
                "currency",
                "remote_id",
                "remote_state",
            ])?;
        }
        for payment in payments {
            self.writer.serialize(PaymentRecord::from(payment))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Price;
    use crate::domain::payment::{NewPayment, PaymentId, PaymentState};
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_header_and_rows() {
        let mut payment = Payment::from_new(
            PaymentId::generate(),
            NewPayment {
                order_id: "1".to_string(),
                amount: Price::new(dec!(100.00), "ZAR"),
                state: PaymentState::PartiallyRefunded,
                remote_id: "TX-1".to_string(),
                remote_state: "Refunded".to_string(),
                return_message: String::new(),
            },
        );
        payment.refunded_amount = Price::new(dec!(40.00), "ZAR");

        let mut out = Vec::new();
        PaymentWriter::new(&mut out).write_payments(&[payment]).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("order,state,amount,refunded,currency,remote_id,remote_state")
        );
        assert_eq!(
            lines.next(),
            Some("1,partially_refunded,100.00,40.00,ZAR,TX-1,Refunded")
        );
    }

    #[test]
    fn test_empty_report_still_has_header() {
        let mut out = Vec::new();
        PaymentWriter::new(&mut out).write_payments(&[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "order,state,amount,refunded,currency,remote_id,remote_state\n"
        );
    }
}
