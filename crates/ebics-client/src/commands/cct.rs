use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_crypto::{nonce, utc_timestamp};
use ebics_xml::names::NS_PAIN_001;
use ebics_xml::Element;

use crate::config::EbicsConfig;
use crate::transaction::TransactionOutcome;

use super::{Command, UploadResponse};

/// Parameters of one SEPA credit transfer order (pain.001.001.03).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CctParams {
    /// Message ID for the group header; generated when absent.
    #[serde(default)]
    pub message_id: Option<String>,
    pub initiating_party: String,
    pub payment_infos: Vec<PaymentInfo>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub payment_info_id: String,
    pub debtor_name: String,
    pub debtor_iban: String,
    pub debtor_bic: String,
    pub requested_execution_date: NaiveDate,
    pub transfers: Vec<CreditTransfer>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreditTransfer {
    pub end_to_end_id: String,
    pub creditor_name: String,
    pub creditor_iban: String,
    pub creditor_bic: String,
    /// Decimal amount as a string, e.g. `"1234.56"`.
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub remittance: Option<String>,
}

impl CctParams {
    fn transaction_count(&self) -> usize {
        self.payment_infos.iter().map(|p| p.transfers.len()).sum()
    }

    /// Emit the `pain.001.001.03` document.
    pub fn to_pain_document(&self) -> Result<Element, EbicsError> {
        if self.transaction_count() == 0 {
            return Err(EbicsError::CreateRequest(
                "credit transfer order without transactions".into(),
            ));
        }

        let message_id = self
            .message_id
            .clone()
            .unwrap_or_else(|| hex::encode_upper(nonce()));

        let mut initiation = Element::new("CstmrCdtTrfInitn").child(
            Element::new("GrpHdr")
                .child(Element::with_text("MsgId", message_id))
                .child(Element::with_text("CreDtTm", utc_timestamp()))
                .child(Element::with_text("NbOfTxs", self.transaction_count().to_string()))
                .child(Element::new("InitgPty").child(Element::with_text("Nm", &self.initiating_party))),
        );

        for info in &self.payment_infos {
            let mut pmt_inf = Element::new("PmtInf")
                .child(Element::with_text("PmtInfId", &info.payment_info_id))
                .child(Element::with_text("PmtMtd", "TRF"))
                .child(Element::with_text(
                    "ReqdExctnDt",
                    info.requested_execution_date.format("%Y-%m-%d").to_string(),
                ))
                .child(Element::new("Dbtr").child(Element::with_text("Nm", &info.debtor_name)))
                .child(iban_account("DbtrAcct", &info.debtor_iban))
                .child(bic_agent("DbtrAgt", &info.debtor_bic))
                .child(Element::with_text("ChrgBr", "SLEV"));

            for transfer in &info.transfers {
                let mut tx = Element::new("CdtTrfTxInf")
                    .child(
                        Element::new("PmtId")
                            .child(Element::with_text("EndToEndId", &transfer.end_to_end_id)),
                    )
                    .child(
                        Element::new("Amt").child(
                            Element::with_text("InstdAmt", &transfer.amount)
                                .attr("Ccy", &transfer.currency),
                        ),
                    )
                    .child(bic_agent("CdtrAgt", &transfer.creditor_bic))
                    .child(Element::new("Cdtr").child(Element::with_text("Nm", &transfer.creditor_name)))
                    .child(iban_account("CdtrAcct", &transfer.creditor_iban));
                if let Some(remittance) = &transfer.remittance {
                    tx = tx.child(
                        Element::new("RmtInf").child(Element::with_text("Ustrd", remittance)),
                    );
                }
                pmt_inf = pmt_inf.child(tx);
            }
            initiation = initiation.child(pmt_inf);
        }

        Ok(Element::new("Document")
            .attr("xmlns", NS_PAIN_001)
            .child(initiation))
    }
}

/// CCT: upload a SEPA credit transfer.
pub struct CctCommand {
    pub params: CctParams,
}

impl Command for CctCommand {
    type Response = UploadResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Cct
    }

    fn order_attribute(&self) -> OrderAttribute {
        OrderAttribute::Ozhnn
    }

    fn direction(&self) -> TransactionDirection {
        TransactionDirection::Upload
    }

    fn payload(&self, _config: &EbicsConfig) -> Result<Vec<u8>, EbicsError> {
        Ok(self.params.to_pain_document()?.to_document()?.into_bytes())
    }

    fn deserialize(&self, outcome: TransactionOutcome) -> Result<Self::Response, EbicsError> {
        Ok(UploadResponse {
            status: outcome.status,
        })
    }
}

/// `<name><Id><IBAN>…</IBAN></Id></name>`
pub(super) fn iban_account(name: &str, iban: &str) -> Element {
    Element::new(name).child(Element::new("Id").child(Element::with_text("IBAN", iban)))
}

/// `<name><FinInstnId><BIC>…</BIC></FinInstnId></name>`
pub(super) fn bic_agent(name: &str, bic: &str) -> Element {
    Element::new(name).child(Element::new("FinInstnId").child(Element::with_text("BIC", bic)))
}
