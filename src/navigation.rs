//! The navigation bar shown at the top of every signed-in page.

use maud::{Markup, html};

use crate::endpoints;

/// The pages reachable from the navigation bar, in display order.
const PAGES: [(&str, &str); 3] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard"),
    (endpoints::CATEGORIES_VIEW, "Categories"),
    (endpoints::PROFILE_VIEW, "Account"),
];

const LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
    dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
    dark:hover:text-white lg:dark:hover:bg-transparent";

const CURRENT_LINK_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";

const LOG_OUT_STYLE: &str = "block py-2 px-3 text-red-600 rounded-sm hover:bg-gray-100
    lg:hover:bg-transparent lg:p-0 lg:hover:underline dark:text-red-400
    dark:hover:bg-gray-700 lg:dark:hover:bg-transparent";

/// The navigation bar, with the link for `current_page` highlighted.
///
/// Pages that are not in the bar, e.g. the log-in page, simply highlight
/// nothing.
pub struct NavBar<'a> {
    current_page: &'a str,
}

impl<'a> NavBar<'a> {
    pub fn new(current_page: &'a str) -> Self {
        Self { current_page }
    }

    pub fn into_html(self) -> Markup {
        // Layout based on https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::DASHBOARD_VIEW)
                        class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                    {
                        "Budget View"
                    }

                    ul
                        class="font-medium flex flex-row flex-wrap gap-4 p-4 mt-4 border
                        border-gray-100 rounded bg-gray-50 lg:space-x-8 lg:p-0 lg:mt-0
                        lg:border-0 lg:bg-white dark:bg-gray-800 lg:dark:bg-gray-900
                        dark:border-gray-700"
                    {
                        @for (url, title) in PAGES {
                            @let is_current = url == self.current_page;

                            li {
                                a
                                    href=(url)
                                    class=(if is_current { CURRENT_LINK_STYLE } else { LINK_STYLE })
                                    aria-current=[is_current.then_some("page")]
                                {
                                    (title)
                                }
                            }
                        }

                        li {
                            a href=(endpoints::LOG_OUT) class=(LOG_OUT_STYLE) { "Log out" }
                        }
                    }
                }
            }
        )
    }
}
