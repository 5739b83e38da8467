use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ebics_core::types::{OrderAttribute, OrderType, TransactionDirection};
use ebics_core::EbicsError;
use ebics_crypto::{nonce, utc_timestamp};
use ebics_xml::names::NS_PAIN_008;
use ebics_xml::Element;

use crate::config::EbicsConfig;
use crate::transaction::TransactionOutcome;

use super::cct::{bic_agent, iban_account};
use super::{Command, UploadResponse};

/// Parameters of one SEPA direct debit order (pain.008.001.02).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CddParams {
    #[serde(default)]
    pub message_id: Option<String>,
    pub initiating_party: String,
    pub payment_infos: Vec<DebitPaymentInfo>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebitPaymentInfo {
    pub payment_info_id: String,
    pub creditor_name: String,
    pub creditor_iban: String,
    pub creditor_bic: String,
    /// SEPA creditor identifier (`CdtrSchmeId`), e.g. `DE98ZZZ09999999999`.
    pub creditor_id: String,
    pub requested_collection_date: NaiveDate,
    pub debits: Vec<DirectDebit>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectDebit {
    pub end_to_end_id: String,
    pub mandate_id: String,
    pub mandate_date: NaiveDate,
    pub debtor_name: String,
    pub debtor_iban: String,
    pub debtor_bic: String,
    /// Decimal amount as a string, e.g. `"99.90"`.
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub remittance: Option<String>,
}

impl CddParams {
    fn transaction_count(&self) -> usize {
        self.payment_infos.iter().map(|p| p.debits.len()).sum()
    }

    /// Emit the `pain.008.001.02` document.
    pub fn to_pain_document(&self) -> Result<Element, EbicsError> {
        if self.transaction_count() == 0 {
            return Err(EbicsError::CreateRequest(
                "direct debit order without transactions".into(),
            ));
        }

        let message_id = self
            .message_id
            .clone()
            .unwrap_or_else(|| hex::encode_upper(nonce()));

        let mut initiation = Element::new("CstmrDrctDbtInitn").child(
            Element::new("GrpHdr")
                .child(Element::with_text("MsgId", message_id))
                .child(Element::with_text("CreDtTm", utc_timestamp()))
                .child(Element::with_text("NbOfTxs", self.transaction_count().to_string()))
                .child(Element::new("InitgPty").child(Element::with_text("Nm", &self.initiating_party))),
        );

        for info in &self.payment_infos {
            let mut pmt_inf = Element::new("PmtInf")
                .child(Element::with_text("PmtInfId", &info.payment_info_id))
                .child(Element::with_text("PmtMtd", "DD"))
                .child(Element::with_text(
                    "ReqdColltnDt",
                    info.requested_collection_date.format("%Y-%m-%d").to_string(),
                ))
                .child(Element::new("Cdtr").child(Element::with_text("Nm", &info.creditor_name)))
                .child(iban_account("CdtrAcct", &info.creditor_iban))
                .child(bic_agent("CdtrAgt", &info.creditor_bic))
                .child(Element::with_text("ChrgBr", "SLEV"))
                .child(creditor_scheme_id(&info.creditor_id));

            for debit in &info.debits {
                let mut tx = Element::new("DrctDbtTxInf")
                    .child(
                        Element::new("PmtId")
                            .child(Element::with_text("EndToEndId", &debit.end_to_end_id)),
                    )
                    .child(
                        Element::with_text("InstdAmt", &debit.amount).attr("Ccy", &debit.currency),
                    )
                    .child(
                        Element::new("DrctDbtTx").child(
                            Element::new("MndtRltdInf")
                                .child(Element::with_text("MndtId", &debit.mandate_id))
                                .child(Element::with_text(
                                    "DtOfSgntr",
                                    debit.mandate_date.format("%Y-%m-%d").to_string(),
                                )),
                        ),
                    )
                    .child(bic_agent("DbtrAgt", &debit.debtor_bic))
                    .child(Element::new("Dbtr").child(Element::with_text("Nm", &debit.debtor_name)))
                    .child(iban_account("DbtrAcct", &debit.debtor_iban));
                if let Some(remittance) = &debit.remittance {
                    tx = tx.child(
                        Element::new("RmtInf").child(Element::with_text("Ustrd", remittance)),
                    );
                }
                pmt_inf = pmt_inf.child(tx);
            }
            initiation = initiation.child(pmt_inf);
        }

        Ok(Element::new("Document")
            .attr("xmlns", NS_PAIN_008)
            .child(initiation))
    }
}

fn creditor_scheme_id(creditor_id: &str) -> Element {
    Element::new("CdtrSchmeId").child(
        Element::new("Id").child(
            Element::new("PrvtId").child(
                Element::new("Othr")
                    .child(Element::with_text("Id", creditor_id))
                    .child(
                        Element::new("SchmeNm").child(Element::with_text("Prtry", "SEPA")),
                    ),
            ),
        ),
    )
}

/// CDD: upload a SEPA direct debit.
pub struct CddCommand {
    pub params: CddParams,
}

impl Command for CddCommand {
    type Response = UploadResponse;

    fn order_type(&self) -> OrderType {
        OrderType::Cdd
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
