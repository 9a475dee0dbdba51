//! Opaque dispatcher boundary: `RawAction { action_type, data }` in, payload
//! bytes out, for callers that speak the original wire contract. Payloads are
//! JSON. Decoding completes in full before anything is acted on, so a
//! malformed payload can never leave a half-applied action behind; an
//! unrecognized tag fails before its payload is even looked at.

use super::core::Engine;
use super::dispatch::{AdminAction, AdminResponse, StateAction, StateResponse, ViewAction, ViewResponse};
use super::results::EngineError;
use super::views::RewardsData;
use crate::market::VenueParams;
use crate::oracle::OracleConfig;
use crate::risk::RiskParams;
use crate::types::{AccountId, MarketId, OracleId, Quote};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// view dispatcher tags
pub const GET_ORACLES: u8 = 0;
pub const GET_MARKETS: u8 = 1;
pub const CALC_FEE_AND_SLIPPAGE: u8 = 2;
pub const GET_POSITION: u8 = 3;
pub const CALC_CLOSE: u8 = 4;
pub const CALC_REWARDS: u8 = 5;

// state dispatcher tags
pub const CLAIM_REWARDS: u8 = 0;

// admin dispatcher tags
pub const ADD_MARKET: u8 = 0;
pub const ADD_ORACLE: u8 = 1;
pub const REMOVE_ORACLE: u8 = 2;
pub const CHANGE_ORACLE: u8 = 3;
pub const SET_INSURANCE: u8 = 4;
pub const CHANGE_RISK: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAction {
    pub action_type: u8,
    pub data: Vec<u8>,
}

impl RawAction {
    pub fn new<T: Serialize>(action_type: u8, payload: &T) -> Self {
        Self {
            action_type,
            data: serde_json::to_vec(payload).unwrap_or_default(),
        }
    }
}

// collateral rides along in the original request shape; the projection itself
// keys off notional alone
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeAndSlippageParams {
    pub market: MarketId,
    pub notional: Decimal,
    pub collateral: Decimal,
    pub is_long: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetPositionParams {
    pub market: MarketId,
    pub account: AccountId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalcCloseParams {
    pub market: MarketId,
    pub account: AccountId,
    pub close_ratio: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalcRewardsParams {
    pub account: AccountId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClaimRewardsParams {
    pub account: AccountId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AddMarketParams {
    pub asset_oracle: OracleId,
    pub params: VenueParams,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AddOracleParams {
    pub config: OracleConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RemoveOracleParams {
    pub oracle: OracleId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChangeOracleParams {
    pub oracle: OracleId,
    pub config: OracleConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetInsuranceParams {
    pub params: VenueParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRiskParams {
    pub params: RiskParams,
}

pub fn view_dispatcher(engine: &Engine, action: &RawAction) -> Result<Vec<u8>, EngineError> {
    let response = match action.action_type {
        // listing tags carry a placeholder payload in the original ABI; ignored here
        GET_ORACLES => engine.dispatch_view(ViewAction::GetOracles)?,
        GET_MARKETS => engine.dispatch_view(ViewAction::GetMarkets)?,
        CALC_FEE_AND_SLIPPAGE => {
            let p: FeeAndSlippageParams = decode(&action.data)?;
            engine.dispatch_view(ViewAction::CalcFeeAndSlippage {
                market: p.market,
                notional: Quote::new(p.notional),
                is_long: p.is_long,
            })?
        }
        GET_POSITION => {
            let p: GetPositionParams = decode(&action.data)?;
            engine.dispatch_view(ViewAction::GetPosition {
                market: p.market,
                account: p.account,
            })?
        }
        CALC_CLOSE => {
            let p: CalcCloseParams = decode(&action.data)?;
            engine.dispatch_view(ViewAction::CalcClose {
                market: p.market,
                account: p.account,
                close_ratio: p.close_ratio,
            })?
        }
        CALC_REWARDS => {
            let p: CalcRewardsParams = decode(&action.data)?;
            engine.dispatch_view(ViewAction::CalcRewards { account: p.account })?
        }
        tag => return Err(EngineError::UnknownAction(tag)),
    };

    match response {
        ViewResponse::Oracles(rows) => encode(&rows),
        ViewResponse::Markets(rows) => encode(&rows),
        ViewResponse::FeeAndSlippage(data) => encode(&data),
        ViewResponse::Position(data) => encode(&data),
        ViewResponse::Close(data) => encode(&data),
        ViewResponse::Rewards(data) => encode(&data),
    }
}

pub fn state_dispatcher(engine: &mut Engine, action: &RawAction) -> Result<Vec<u8>, EngineError> {
    match action.action_type {
        CLAIM_REWARDS => {
            let p: ClaimRewardsParams = decode(&action.data)?;
            let StateResponse::RewardsClaimed { account, amount } =
                engine.dispatch_state(StateAction::ClaimRewards { account: p.account })?;
            // the claim response mirrors the CalcRewards view shape
            encode(&RewardsData {
                account,
                rewards_total: amount,
            })
        }
        tag => Err(EngineError::UnknownAction(tag)),
    }
}

// the caller identity check runs before payload decode: a non-admin learns
// nothing about payload validity
pub fn admin_dispatcher(
    engine: &mut Engine,
    caller: AccountId,
    action: &RawAction,
) -> Result<Vec<u8>, EngineError> {
    if caller != engine.config().admin {
        return Err(EngineError::Unauthorized);
    }

    let typed = match action.action_type {
        ADD_MARKET => {
            let p: AddMarketParams = decode(&action.data)?;
            AdminAction::AddMarket {
                asset_oracle: p.asset_oracle,
                params: p.params,
            }
        }
        ADD_ORACLE => {
            let p: AddOracleParams = decode(&action.data)?;
            AdminAction::AddOracle { config: p.config }
        }
        REMOVE_ORACLE => {
            let p: RemoveOracleParams = decode(&action.data)?;
            AdminAction::RemoveOracle { oracle: p.oracle }
        }
        CHANGE_ORACLE => {
            let p: ChangeOracleParams = decode(&action.data)?;
            AdminAction::ChangeOracle {
                oracle: p.oracle,
                config: p.config,
            }
        }
        SET_INSURANCE => {
            let p: SetInsuranceParams = decode(&action.data)?;
            AdminAction::SetInsurance { params: p.params }
        }
        CHANGE_RISK => {
            let p: ChangeRiskParams = decode(&action.data)?;
            AdminAction::ChangeRisk { params: p.params }
        }
        tag => return Err(EngineError::UnknownAction(tag)),
    };

    match engine.dispatch_admin(caller, typed)? {
        AdminResponse::MarketAdded { market } => encode(&market),
        AdminResponse::OracleAdded { oracle } => encode(&oracle),
        AdminResponse::OracleRemoved { oracle } => encode(&oracle),
        AdminResponse::OracleChanged { oracle } => encode(&oracle),
        AdminResponse::InsuranceSet { venue } => encode(&venue),
        AdminResponse::RiskChanged => encode(&true),
    }
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, EngineError> {
    serde_json::from_slice(data).map_err(|_| EngineError::BadParams)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, EngineError> {
    serde_json::to_vec(value).map_err(|_| EngineError::EncodeFailed)
}
