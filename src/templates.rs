use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, html};

use crate::{
    entities::{movie, person, user},
    models::{MovieDetail, MoviePage, PersonDetail, TopMovie, ViewerVote, VoteValue},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const LINK: &str = "text-blue-600 hover:text-blue-800";
const CARD: &str = "bg-white shadow rounded-lg p-8";
const INPUT: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const BUTTON: &str = "rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";

pub fn movie_list_page(page: &MoviePage, viewer: Option<&user::Model>) -> String {
    layout(
        "Movies",
        viewer,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Movies" }
            @if page.movies.is_empty() {
                p class="mt-6 text-gray-600" { "No movies yet." }
            } @else {
                ul class="mt-6 divide-y divide-gray-200" {
                    @for movie in &page.movies {
                        li class="py-3" { (movie_link(movie)) }
                    }
                }
            }
            nav class="mt-8 flex items-center justify-between text-sm" {
                @if page.is_first() {
                    span class="text-gray-400" { "Previous" }
                } @else {
                    a class=(LINK) href=(format!("/movies/?page={}", page.number - 1)) { "Previous" }
                }
                span class="text-gray-600" { "Page " (page.number) " of " (page.num_pages) }
                @if page.is_last() {
                    span class="text-gray-400" { "Next" }
                } @else {
                    a class=(LINK) href=(format!("/movies/?page={}", page.number + 1)) { "Next" }
                }
            }
        },
    )
}

pub fn top_movies_page(top: &[TopMovie], viewer: Option<&user::Model>) -> String {
    layout(
        "Top movies",
        viewer,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { "Top movies" }
            @if top.is_empty() {
                p class="mt-6 text-gray-600" { "Nobody has voted yet." }
            } @else {
                ol class="mt-6 space-y-2 list-decimal list-inside" {
                    @for entry in top {
                        li {
                            a class=(LINK) href=(format!("/movie/{}/", entry.id)) {
                                (entry.title) " (" (entry.year) ")"
                            }
                            span class="ml-2 text-gray-500" { "score " (entry.score) }
                        }
                    }
                }
            }
        },
    )
}

pub fn movie_detail_page(
    detail: &MovieDetail,
    viewer: Option<&user::Model>,
    vote: Option<&ViewerVote>,
) -> String {
    let movie = &detail.movie;
    layout(
        &movie.display_name(),
        viewer,
        html! {
            h1 class="text-3xl font-bold text-gray-900" {
                (movie.title)
                span class="ml-2 font-normal text-gray-500" { "(" (movie.year) ")" }
            }
            p class="mt-2 text-sm text-gray-500" {
                (detail.rating.label()) " · " (movie.runtime) " min"
                @if let Some(website) = &movie.website {
                    " · " a class=(LINK) href=(website) rel="noopener noreferrer" { "Website" }
                }
            }
            p class="mt-6 text-gray-700 whitespace-pre-line" { (movie.plot) }

            dl class="mt-6 grid grid-cols-3 gap-2 text-sm" {
                dt class="font-semibold text-gray-700" { "Director" }
                dd class="col-span-2" {
                    @if let Some(director) = &detail.director {
                        (person_link(director))
                    } @else {
                        span class="text-gray-400" { "Unknown" }
                    }
                }
                dt class="font-semibold text-gray-700" { "Writers" }
                dd class="col-span-2" {
                    @for (i, writer) in detail.writers.iter().enumerate() {
                        @if i > 0 { ", " }
                        (person_link(writer))
                    }
                }
                dt class="font-semibold text-gray-700" { "Score" }
                dd class="col-span-2" id="score" { (detail.score) }
            }

            @if !detail.actors.is_empty() {
                h2 class="mt-8 text-xl font-semibold text-gray-900" { "Cast" }
                ul class="mt-2 space-y-1" {
                    @for credit in &detail.actors {
                        li class="text-sm" {
                            (person_link(&credit.person))
                            span class="text-gray-500" { " as " (credit.role) }
                        }
                    }
                }
            }

            @if let Some(vote) = vote {
                (vote_form(vote))
            }

            @if !detail.images.is_empty() {
                div class="mt-8 grid grid-cols-3 gap-4" {
                    @for image in &detail.images {
                        img class="rounded" src=(format!("/media/{}", image.image)) alt=(movie.title);
                    }
                }
            }

            @if viewer.is_some() {
                (image_form(movie.id))
            } @else {
                p class="mt-8 text-sm text-gray-600" {
                    a class=(LINK) href=(format!("/accounts/login?next=/movie/{}/", movie.id)) { "Log in" }
                    " to vote or upload images."
                }
            }
        },
    )
}

fn vote_form(vote: &ViewerVote) -> Markup {
    html! {
        form id="vote-form" class="mt-8 flex items-center gap-4" method="post" action=(vote.form_action()) {
            label class="flex items-center gap-1" {
                input type="radio" name="value" value=(VoteValue::Up.as_value()) checked[vote.value == Some(VoteValue::Up)];
                "👍"
            }
            label class="flex items-center gap-1" {
                input type="radio" name="value" value=(VoteValue::Down.as_value()) checked[vote.value == Some(VoteValue::Down)];
                "👎"
            }
            button class=(BUTTON) type="submit" { "Vote" }
        }
    }
}

fn image_form(movie_id: i32) -> Markup {
    html! {
        form id="image-form" class="mt-8 space-y-2" method="post" enctype="multipart/form-data" action=(format!("/movie/{movie_id}/image/upload")) {
            label class="block text-sm font-medium text-gray-700" for="image" { "Upload an image" }
            input id="image" type="file" name="image" accept="image/*" required;
            button class=(BUTTON) type="submit" { "Upload" }
        }
    }
}

pub fn person_detail_page(detail: &PersonDetail, viewer: Option<&user::Model>) -> String {
    let person = &detail.person;
    layout(
        &person.display_name(),
        viewer,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { (person.first_name) " " (person.last_name) }
            p class="mt-2 text-gray-500" {
                "Born " (person.born)
                @if let Some(died) = &person.died { ", died " (died) }
            }
            (movie_section("Directed", &detail.directed))
            (movie_section("Written", &detail.written))
            @if !detail.roles.is_empty() {
                h2 class="mt-8 text-xl font-semibold text-gray-900" { "Acted" }
                ul class="mt-2 space-y-1" {
                    @for credit in &detail.roles {
                        li class="text-sm" {
                            (movie_link(&credit.movie))
                            span class="text-gray-500" { " as " (credit.role) }
                        }
                    }
                }
            }
        },
    )
}

fn movie_section(label: &str, movies: &[movie::Model]) -> Markup {
    html! {
        @if !movies.is_empty() {
            h2 class="mt-8 text-xl font-semibold text-gray-900" { (label) }
            ul class="mt-2 space-y-1" {
                @for movie in movies {
                    li class="text-sm" { (movie_link(movie)) }
                }
            }
        }
    }
}

pub fn login_page(next: &str, error: Option<&str>) -> String {
    layout(
        "Log in",
        None,
        html! {
            div class=(CARD) {
                h1 class="text-2xl font-bold text-gray-900" { "Log in" }
                @if let Some(error) = error {
                    p class="mt-4 text-red-600" { (error) }
                }
                form class="mt-6 space-y-4" method="post" action=(format!("/accounts/login?next={}", urlencoding::encode(next))) {
                    div {
                        label class="block text-sm font-medium text-gray-700" for="username" { "Username" }
                        input class=(INPUT) id="username" name="username" required;
                    }
                    div {
                        label class="block text-sm font-medium text-gray-700" for="password" { "Password" }
                        input class=(INPUT) id="password" name="password" type="password" required;
                    }
                    button class=(BUTTON) type="submit" { "Log in" }
                }
                p class="mt-4 text-sm text-gray-600" {
                    "No account? " a class=(LINK) href="/accounts/register" { "Register" }
                }
            }
        },
    )
}

pub fn register_page(error: Option<&str>) -> String {
    layout(
        "Register",
        None,
        html! {
            div class=(CARD) {
                h1 class="text-2xl font-bold text-gray-900" { "Register" }
                @if let Some(error) = error {
                    p class="mt-4 text-red-600" { (error) }
                }
                form class="mt-6 space-y-4" method="post" action="/accounts/register" {
                    div {
                        label class="block text-sm font-medium text-gray-700" for="username" { "Username" }
                        input class=(INPUT) id="username" name="username" required;
                    }
                    div {
                        label class="block text-sm font-medium text-gray-700" for="password" { "Password" }
                        input class=(INPUT) id="password" name="password" type="password" minlength="8" required;
                    }
                    div {
                        label class="block text-sm font-medium text-gray-700" for="confirm" { "Confirm password" }
                        input class=(INPUT) id="confirm" name="confirm" type="password" minlength="8" required;
                    }
                    button class=(BUTTON) type="submit" { "Register" }
                }
            }
        },
    )
}

pub fn error_page(status: StatusCode, message: String) -> String {
    layout(
        "Error",
        None,
        html! {
            div class=(CARD) {
                h1 class="text-2xl font-bold text-gray-900" { "Error " (status.as_u16()) }
                p class="mt-4 text-gray-700" { (message) }
                a class=(format!("mt-6 inline-block {LINK}")) href="/movies/" { "Back" }
            }
        },
    )
}

fn layout(title: &str, viewer: Option<&user::Model>, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                header class="bg-white shadow" {
                    nav class="max-w-4xl mx-auto px-6 py-4 flex items-center gap-6 text-sm" {
                        a class="font-bold text-gray-900" href="/movies/" { "Movies" }
                        a class=(LINK) href="/movies/top" { "Top 10" }
                        span class="ml-auto" {}
                        @if let Some(user) = viewer {
                            span class="text-gray-600" { (user.username) }
                            form method="post" action="/accounts/logout" {
                                button class=(LINK) type="submit" { "Log out" }
                            }
                        } @else {
                            a class=(LINK) href="/accounts/login" { "Log in" }
                            a class=(LINK) href="/accounts/register" { "Register" }
                        }
                    }
                }
                main class="max-w-4xl mx-auto px-6 py-10" { (body) }
            }
        }
    }
    .into_string()
}

fn movie_link(movie: &movie::Model) -> Markup {
    html! {
        a class=(LINK) href=(format!("/movie/{}/", movie.id)) { (movie.display_name()) }
    }
}

fn person_link(person: &person::Model) -> Markup {
    html! {
        a class=(LINK) href=(format!("/person/{}/", person.id)) { (person.first_name) " " (person.last_name) }
    }
}
