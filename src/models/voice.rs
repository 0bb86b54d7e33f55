use serde::{ Serialize, Deserialize };

#[derive(Deserialize, Debug, Default)]
pub struct CallRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateAssistantRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhoneNumberRequest {
    #[serde(default)]
    pub assistant_id: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallStarted {
    pub message: String,
    pub call_id: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssistantCreated {
    pub message: String,
    pub assistant_id: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumberCreated {
    pub message: String,
    pub phone_number_id: Option<String>,
    pub phone_number: String,
}

#[derive(Serialize, Debug)]
pub struct VoiceErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
