use reqwest::Url;

use super::access::Denial;
use crate::config::RoutesConfig;
use crate::models::UserType;

/// Query parameter carrying the page a user asked for before being sent
/// to log in.
pub const RETURN_TO_PARAM: &str = "returnTo";

/// Client-side paths the guards and shells redirect between.
#[derive(Debug, Clone)]
pub struct Routes {
    config: RoutesConfig,
}

impl Routes {
    pub fn new(config: &RoutesConfig) -> Self {
        Routes {
            config: config.clone(),
        }
    }

    /// The public landing page users return to after logging out.
    pub fn landing(&self) -> &str {
        &self.config.home
    }

    /// The login page for a view. Admin views have their own login.
    pub fn login_for(&self, required: Option<UserType>) -> &str {
        match required {
            Some(UserType::Admin) => &self.config.admin_login,
            _ => &self.config.login,
        }
    }

    /// Where a user of this type lands after logging in.
    pub fn home_for(&self, user_type: UserType) -> &str {
        match user_type {
            UserType::Freelancer => &self.config.talent_dashboard,
            UserType::Company => &self.config.company_dashboard,
            UserType::Admin => &self.config.admin_dashboard,
        }
    }

    /// Login pages are public; guarding them is what caused redirect loops.
    pub fn is_login_page(&self, path: &str) -> bool {
        let path = strip_query(path);
        path == self.config.login || path == self.config.admin_login
    }

    /// `login?returnTo=<requested>`, with the requested path percent-encoded.
    pub fn login_redirect(&self, required: Option<UserType>, requested_path: &str) -> String {
        let login = self.login_for(required);
        // Any absolute base works; only the path and query are kept.
        let mut url = match Url::parse("http://localhost").and_then(|base| base.join(login)) {
            Ok(url) => url,
            Err(_) => return login.to_string(),
        };
        if !requested_path.is_empty() && !self.is_login_page(requested_path) {
            url.query_pairs_mut()
                .append_pair(RETURN_TO_PARAM, requested_path);
        }
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    }

    /// Where a denied view sends the user. Anonymous users go to log in and
    /// come back afterwards; a signed-in user of another type goes home.
    pub fn redirect_for(
        &self,
        denial: Denial,
        required: Option<UserType>,
        requested_path: &str,
    ) -> String {
        match denial {
            Denial::NotAuthenticated => self.login_redirect(required, requested_path),
            Denial::WrongUserType { actual, .. } => self.home_for(actual).to_string(),
        }
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}
